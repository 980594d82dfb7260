mod fixtures;

use fixtures::Recorder;
use proptest::prelude::*;
use tether_emitter::Emitter;

const HANDLERS: usize = 5;

proptest! {
    #[test]
    fn emit_follows_first_registration_order(
        ops in proptest::collection::vec((any::<bool>(), 0..HANDLERS), 0..64)
    ) {
        let emitter = Emitter::<u32>::new();
        let recorder = Recorder::new();
        let handlers: Vec<_> = (0..HANDLERS).map(|i| recorder.handler(format!("h{i}"))).collect();

        let mut expected_order: Vec<usize> = Vec::new();
        for (register, idx) in ops {
            if register {
                emitter.on("evt", handlers[idx].clone());
                if !expected_order.contains(&idx) {
                    expected_order.push(idx);
                }
            } else {
                emitter.off("evt", &handlers[idx]);
                expected_order.retain(|&i| i != idx);
            }
        }

        emitter.emit("evt", 0);

        let expected: Vec<String> = expected_order.iter().map(|i| format!("h{i}(0)")).collect();
        prop_assert_eq!(recorder.calls(), expected);
        prop_assert_eq!(emitter.listener_count("evt"), expected_order.len());
    }

    #[test]
    fn once_fires_at_most_once_for_any_number_of_emits(emits in 0usize..8) {
        let emitter = Emitter::<u32>::new();
        let recorder = Recorder::new();
        emitter.once("evt", recorder.handler("once"));

        for n in 0..emits {
            emitter.emit("evt", u32::try_from(n).unwrap());
        }

        prop_assert_eq!(recorder.count(), emits.min(1));
        prop_assert_eq!(emitter.listener_count("evt"), usize::from(emits == 0));
    }
}
