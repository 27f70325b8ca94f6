//! Observer pattern for synthesis progress
//!
//! The pipeline publishes events as stages finish and as each
//! (sensor, frequency) pair lands in the volume. Subscribers get them
//! synchronously on the driving thread; nothing is buffered.

use std::sync::mpsc::Sender;

/// Pipeline stage boundaries, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Projection,
    DistanceField,
    Normalization,
    Accumulation,
}

/// Event emitted during synthesis
#[derive(Clone, Debug, PartialEq)]
pub enum SynthesisEvent {
    /// A stage finished
    StageComplete { stage: Stage },
    /// A position axis had zero extent; sensors collapsed to 0 on it
    DegenerateAxis { axis: usize },
    /// A spectral slice had no finite energy and contributes nothing
    DegenerateSlice { sensor: usize, frequency: usize },
    /// One (sensor, frequency) pair was added to the volume
    PairAccumulated {
        sensor: usize,
        frequency: usize,
        completed: usize,
        total: usize,
    },
}

/// Observer that receives synthesis events
pub trait SynthesisObserver: Send + Sync {
    fn on_event(&self, event: SynthesisEvent);
}

/// Function-based observer for simple cases
pub struct FnObserver<F: Fn(SynthesisEvent) + Send + Sync>(pub F);

impl<F: Fn(SynthesisEvent) + Send + Sync> SynthesisObserver for FnObserver<F> {
    fn on_event(&self, event: SynthesisEvent) {
        (self.0)(event);
    }
}

/// Channel-based observer - forwards events to a receiver
pub struct ChannelObserver {
    sender: Sender<SynthesisEvent>,
}

impl ChannelObserver {
    pub fn new(sender: Sender<SynthesisEvent>) -> Self {
        Self { sender }
    }
}

impl SynthesisObserver for ChannelObserver {
    fn on_event(&self, event: SynthesisEvent) {
        // A dropped receiver just means nobody is listening
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};

    #[test]
    fn test_fn_observer_receives() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let observer = FnObserver(move |event| {
            if let SynthesisEvent::StageComplete { .. } = event {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        observer.on_event(SynthesisEvent::StageComplete {
            stage: Stage::Projection,
        });
        observer.on_event(SynthesisEvent::DegenerateAxis { axis: 2 });

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_channel_observer_forwards() {
        let (tx, rx) = mpsc::channel();
        let observer = ChannelObserver::new(tx);
        observer.on_event(SynthesisEvent::DegenerateSlice {
            sensor: 1,
            frequency: 3,
        });

        assert_eq!(
            rx.recv().unwrap(),
            SynthesisEvent::DegenerateSlice {
                sensor: 1,
                frequency: 3
            }
        );
    }

    #[test]
    fn test_channel_observer_shared_across_threads() {
        let (tx, rx) = mpsc::channel();
        let observer: Arc<dyn SynthesisObserver> = Arc::new(ChannelObserver::new(tx));

        let handles: Vec<_> = (0..4)
            .map(|axis| {
                let observer = observer.clone();
                std::thread::spawn(move || observer.on_event(SynthesisEvent::DegenerateAxis { axis }))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        drop(observer);

        let mut axes: Vec<usize> = rx
            .iter()
            .map(|e| match e {
                SynthesisEvent::DegenerateAxis { axis } => axis,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        axes.sort_unstable();
        assert_eq!(axes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_channel_observer_survives_dropped_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        ChannelObserver::new(tx).on_event(SynthesisEvent::StageComplete {
            stage: Stage::Accumulation,
        });
    }
}
