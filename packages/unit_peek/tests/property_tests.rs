use proptest::prelude::*;

use unit_peek::{Condition, ConditionConfig, Frame, State, StaticDump, UnitId, UnitRecord, classify};

// --- Classifier ---

const REASONS: &[&str] = &[
    "idle",
    "runnable",
    "running",
    "syscall",
    "waiting",
    "dead",
    "enqueue",
    "copystack",
    "sleep",
    "chan send",
    "chan receive",
    "select",
    "select (no cases)",
    "IO wait",
    "semacquire",
    "semrelease",
    "GC sweep wait",
    "GC assist wait",
    "force gc (idle)",
    "garbage collection",
    "panicwait",
];

const CREATORS: &[&str] = &["app::pool::start", "app::net::serve", "app::cache::refresh"];

proptest! {
    #[test]
    fn classify_never_panics(reason in ".*") {
        let _ = classify(&reason);
    }

    #[test]
    fn lock_prefix_always_waiting_lock(rest in ".*") {
        prop_assert_eq!(classify(&format!("sem{rest}")), State::WaitingLock);
    }

    #[test]
    fn channel_prefix_always_waiting_channel(rest in ".*") {
        prop_assert_eq!(classify(&format!("chan{rest}")), State::WaitingChannel);
    }
}

// --- Filter engine ---

#[derive(Clone, Debug)]
enum Spec {
    StateIs(State),
    StateIsNot(State),
    StateIn(Vec<State>),
    CreatedBy(usize),
    HoldingLock,
    CountGt(usize),
    CountLt(usize),
    CountEq(usize),
}

impl Spec {
    fn add_to(&self, cond: &mut Condition<StaticDump>) {
        match self {
            Spec::StateIs(s) => cond.state_is(*s),
            Spec::StateIsNot(s) => cond.state_is_not(*s),
            Spec::StateIn(states) => cond.state_in(states),
            Spec::CreatedBy(i) => cond
                .created_by_matching(&format!("^{}$", regex::escape(CREATORS[*i])))
                .unwrap(),
            Spec::HoldingLock => cond.holding_lock(),
            Spec::CountGt(v) => cond.count_gt(*v),
            Spec::CountLt(v) => cond.count_lt(*v),
            Spec::CountEq(v) => cond.count_eq(*v),
        };
    }
}

fn arb_state() -> impl Strategy<Value = State> {
    prop::sample::select(State::ALL.to_vec())
}

fn arb_unit_spec() -> impl Strategy<Value = Spec> {
    prop_oneof![
        arb_state().prop_map(Spec::StateIs),
        arb_state().prop_map(Spec::StateIsNot),
        prop::collection::vec(arb_state(), 1..4).prop_map(Spec::StateIn),
        (0..CREATORS.len()).prop_map(Spec::CreatedBy),
        Just(Spec::HoldingLock),
    ]
}

fn arb_spec() -> impl Strategy<Value = Spec> {
    prop_oneof![
        4 => arb_unit_spec(),
        1 => (0usize..8).prop_map(Spec::CountGt),
        1 => (0usize..8).prop_map(Spec::CountLt),
        1 => (0usize..8).prop_map(Spec::CountEq),
    ]
}

fn arb_snapshot() -> impl Strategy<Value = Vec<UnitRecord>> {
    prop::collection::vec(
        (
            prop::sample::select(REASONS.to_vec()),
            0..CREATORS.len(),
            any::<bool>(),
        ),
        0..12,
    )
    .prop_map(|units| {
        units
            .into_iter()
            .enumerate()
            .map(|(i, (reason, creator, locked))| {
                let mut unit = UnitRecord::new(UnitId(i as u64 + 1), reason);
                unit.created_by = Some(Frame::new(CREATORS[creator], "src/lib.rs", 1));
                unit.locked = locked;
                unit
            })
            .collect()
    })
}

fn condition(specs: &[Spec]) -> Condition<StaticDump> {
    let mut cond = Condition::with_config(
        StaticDump::default(),
        &ConditionConfig {
            filter_capacity: specs.len(),
            buffer_size: 16,
        },
    );
    for spec in specs {
        spec.add_to(&mut cond);
    }
    cond
}

proptest! {
    #[test]
    fn no_filters_is_identity(snapshot in arb_snapshot()) {
        prop_assert_eq!(condition(&[]).matching(snapshot.clone()), snapshot);
    }

    #[test]
    fn unit_filters_only_narrow(
        snapshot in arb_snapshot(),
        specs in prop::collection::vec(arb_unit_spec(), 0..6),
    ) {
        let mut previous = snapshot.len();
        for k in 0..=specs.len() {
            let matched = condition(&specs[..k]).matching(snapshot.clone());
            prop_assert!(matched.len() <= previous);
            prop_assert!(matched.iter().all(|unit| snapshot.contains(unit)));
            previous = matched.len();
        }
    }

    #[test]
    fn nothing_recovers_after_rejection(
        snapshot in arb_snapshot(),
        specs in prop::collection::vec(arb_spec(), 1..6),
        extra in prop::collection::vec(arb_spec(), 0..4),
    ) {
        let head = condition(&specs).matching(snapshot.clone());
        prop_assume!(head.is_empty());

        let mut all = specs.clone();
        all.extend(extra);
        prop_assert!(condition(&all).matching(snapshot).is_empty());
    }

    #[test]
    fn unit_filter_order_is_irrelevant(
        snapshot in arb_snapshot(),
        specs in prop::collection::vec(arb_unit_spec(), 0..6),
    ) {
        let forward = condition(&specs).matching(snapshot.clone());
        let mut reversed_specs = specs.clone();
        reversed_specs.reverse();
        let reversed = condition(&reversed_specs).matching(snapshot);
        prop_assert_eq!(forward, reversed);
    }

    #[test]
    fn eval_agrees_with_matching(
        snapshot in arb_snapshot(),
        specs in prop::collection::vec(arb_spec(), 0..6),
    ) {
        let expected = condition(&specs).matching(snapshot.clone());
        let mut live = Condition::with_config(StaticDump::from_units(&snapshot), &ConditionConfig {
            filter_capacity: 0,
            buffer_size: 16,
        });
        for spec in &specs {
            spec.add_to(&mut live);
        }
        prop_assert_eq!(live.eval().unwrap(), expected);
    }
}
