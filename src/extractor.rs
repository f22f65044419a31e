//! Burst event extraction
//!
//! Collapses a raw packet sequence into burst events. Packets closer together
//! than the burst gap belong to one burst; each burst becomes a single event
//! carrying the time of its last packet and the sum of its packet sizes.

use crate::types::{Event, Packet};

/// Extractor for collapsing packet traces into burst events
pub struct EventExtractor;

impl EventExtractor {
    /// Extract burst events from a time-ascending packet trace.
    ///
    /// A packet whose gap from its predecessor is `>= burst_gap_sec` starts a
    /// new burst; the strict `<` comparison keeps a packet in the open burst.
    /// The first packet always opens a burst, and the final burst is closed by
    /// the end of input. An empty trace yields an empty event sequence.
    pub fn extract(packets: &[Packet], burst_gap_sec: f64) -> Vec<Event> {
        let mut events = Vec::new();

        // (time of last packet in the open burst, size accumulated so far)
        let mut open_burst: Option<(f64, u64)> = None;

        for packet in packets {
            open_burst = Some(match open_burst {
                Some((last_time, size)) if packet.time - last_time < burst_gap_sec => {
                    (packet.time, size.saturating_add(packet.size))
                }
                Some((last_time, size)) => {
                    events.push(Event {
                        time: last_time,
                        size,
                    });
                    (packet.time, packet.size)
                }
                None => (packet.time, packet.size),
            });
        }

        if let Some((time, size)) = open_burst {
            events.push(Event { time, size });
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_trace_yields_no_events() {
        assert_eq!(EventExtractor::extract(&[], 0.5), Vec::new());
    }

    #[test]
    fn test_single_packet_becomes_single_event() {
        let events = EventExtractor::extract(&[Packet::new(0.3, 700)], 0.5);
        assert_eq!(
            events,
            vec![Event {
                time: 0.3,
                size: 700
            }]
        );
    }

    #[test]
    fn test_close_packets_collapse_into_one_burst() {
        // First two packets are 0.01s apart, the third arrives 0.78s later
        let trace = vec![
            Packet::new(0.01, 500),
            Packet::new(0.02, 400),
            Packet::new(0.8, 1500),
        ];
        let events = EventExtractor::extract(&trace, 0.5);
        assert_eq!(
            events,
            vec![
                Event {
                    time: 0.02,
                    size: 900
                },
                Event {
                    time: 0.8,
                    size: 1500
                },
            ]
        );
    }

    #[test]
    fn test_gap_exactly_at_threshold_starts_new_burst() {
        let trace = vec![Packet::new(0.0, 100), Packet::new(0.5, 200)];
        let events = EventExtractor::extract(&trace, 0.5);
        assert_eq!(events.len(), 2);

        // Just under the threshold stays in the burst
        let trace = vec![Packet::new(0.0, 100), Packet::new(0.49, 200)];
        let events = EventExtractor::extract(&trace, 0.5);
        assert_eq!(
            events,
            vec![Event {
                time: 0.49,
                size: 300
            }]
        );
    }

    #[test]
    fn test_extraction_is_idempotent_on_aggregated_events() {
        let trace = vec![
            Packet::new(0.01, 500),
            Packet::new(0.02, 400),
            Packet::new(0.8, 1500),
        ];
        let events = EventExtractor::extract(&trace, 0.5);

        // Feed the aggregated events back in as packets: nothing collapses
        // further because surviving gaps are at or above the threshold.
        let as_packets: Vec<Packet> = events
            .iter()
            .map(|e| Packet::new(e.time, e.size))
            .collect();
        let again = EventExtractor::extract(&as_packets, 0.5);
        assert_eq!(again, events);
    }

    #[test]
    fn test_multiple_bursts_accumulate_sizes() {
        let trace = vec![
            Packet::new(0.0, 10),
            Packet::new(0.1, 20),
            Packet::new(0.2, 30),
            Packet::new(2.0, 40),
            Packet::new(2.1, 50),
            Packet::new(10.0, 60),
        ];
        let events = EventExtractor::extract(&trace, 0.5);
        assert_eq!(
            events,
            vec![
                Event {
                    time: 0.2,
                    size: 60
                },
                Event {
                    time: 2.1,
                    size: 90
                },
                Event {
                    time: 10.0,
                    size: 60
                },
            ]
        );
    }
}
