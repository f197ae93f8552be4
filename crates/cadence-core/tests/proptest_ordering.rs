//! Property tests for lifecycle ordering.
//!
//! These tests generate random module counts, tick counts and call sequences
//! and verify that the coordinator always walks modules in declaration order
//! and rejects out-of-order calls without touching module state.

use cadence_core::prelude::*;
use proptest::prelude::*;

/// Host state: an append-only event log of `(phase, module index, tick)`.
type EventLog = Vec<(&'static str, usize, u64)>;

struct Indexed {
    idx: usize,
}

impl Module<EventLog> for Indexed {
    fn initialize(&mut self, log: &mut EventLog) -> Result<(), ModuleError> {
        log.push(("init", self.idx, 0));
        Ok(())
    }

    fn update(&mut self, tick: &TickContext, log: &mut EventLog) -> Result<(), ModuleError> {
        log.push(("update", self.idx, tick.tick));
        Ok(())
    }
}

fn build(module_count: usize) -> Coordinator<EventLog> {
    let mut builder = CoordinatorBuilder::<EventLog>::new();
    for idx in 0..module_count {
        let name = format!("m{idx}");
        builder = if idx == 0 {
            builder.with_module(&name, move |_| Ok(Indexed { idx }))
        } else {
            let previous = format!("m{}", idx - 1);
            builder.with_module_after(&name, &[previous.as_str()], move |_| Ok(Indexed { idx }))
        };
    }
    builder.build(&Dependencies::new()).unwrap()
}

/// Lifecycle calls a host might make, in any order.
#[derive(Debug, Clone)]
enum Call {
    Initialize,
    Update,
    Teardown,
}

fn call_strategy() -> impl Strategy<Value = Call> {
    prop_oneof![
        1 => Just(Call::Initialize),
        4 => Just(Call::Update),
        1 => Just(Call::Teardown),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn updates_follow_declaration_order(module_count in 0usize..24, ticks in 0u64..16) {
        let mut coordinator = build(module_count);
        let mut log = EventLog::new();
        coordinator.initialize_all(&mut log).unwrap();

        let expected_init: EventLog = (0..module_count).map(|i| ("init", i, 0)).collect();
        prop_assert_eq!(&log, &expected_init);
        log.clear();

        for tick in 0..ticks {
            coordinator.update_all(&TickContext::new(tick, 0.5), &mut log).unwrap();
        }

        let expected: EventLog = (0..ticks)
            .flat_map(|t| (0..module_count).map(move |i| ("update", i, t)))
            .collect();
        prop_assert_eq!(log, expected);
    }

    #[test]
    fn random_call_sequences_respect_state_machine(
        module_count in 1usize..8,
        calls in prop::collection::vec(call_strategy(), 1..32),
    ) {
        let mut coordinator = build(module_count);
        let mut log = EventLog::new();
        let mut model = LifecycleState::Constructed;
        let mut tick = 0u64;

        for call in calls {
            let before = log.len();
            match call {
                Call::Initialize => {
                    let result = coordinator.initialize_all(&mut log);
                    match model {
                        LifecycleState::Constructed => {
                            prop_assert!(result.is_ok());
                            prop_assert_eq!(log.len(), before + module_count);
                            model = LifecycleState::Initialized;
                        }
                        LifecycleState::Initialized => {
                            prop_assert!(matches!(result, Err(LifecycleError::AlreadyInitialized)));
                            prop_assert_eq!(log.len(), before);
                        }
                        LifecycleState::TornDown => {
                            prop_assert!(matches!(result, Err(LifecycleError::TornDown)));
                            prop_assert_eq!(log.len(), before);
                        }
                    }
                }
                Call::Update => {
                    let result = coordinator.update_all(&TickContext::new(tick, 1.0), &mut log);
                    match model {
                        LifecycleState::Initialized => {
                            prop_assert!(result.is_ok());
                            prop_assert_eq!(log.len(), before + module_count);
                            tick += 1;
                        }
                        LifecycleState::Constructed => {
                            prop_assert!(matches!(result, Err(LifecycleError::NotInitialized)));
                            prop_assert_eq!(log.len(), before);
                        }
                        LifecycleState::TornDown => {
                            prop_assert!(matches!(result, Err(LifecycleError::TornDown)));
                            prop_assert_eq!(log.len(), before);
                        }
                    }
                }
                Call::Teardown => {
                    let result = coordinator.teardown();
                    if model == LifecycleState::TornDown {
                        prop_assert!(matches!(result, Err(LifecycleError::TornDown)));
                    } else {
                        prop_assert!(result.is_ok());
                        model = LifecycleState::TornDown;
                    }
                }
            }

            // Invariant: the coordinator never disagrees with the model.
            prop_assert_eq!(coordinator.state(), model);
        }
    }
}
