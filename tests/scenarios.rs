//! End-to-end scenarios driving whole programs through `Program::run_cb`,
//! each grounded in a concrete host integration rather than a single rule.

use microlog::{
    any, call, relation, variable, CallReturn, Conjoinable, FnMapping, HeadLike, Program,
    ProgramError, TemporalAnnotation, Value,
};

/// Connect-Four winner detection: horizontal four-in-a-row only, using a
/// `besides(C1, C2)` adjacency table in place of arithmetic (Datalog has
/// no `+`), the way a column-adjacency lookup stands in for `C2 = C1 - 1`.
#[test]
fn connect_four_detects_a_horizontal_winner() {
    let player = relation("player");
    let marker = relation("marker");
    let besides = relation("besides");
    let winner = relation("winner");

    let p = variable("P");
    let c1 = variable("C1");
    let c2 = variable("C2");
    let c3 = variable("C3");
    let c4 = variable("C4");
    let r = variable("R");

    let mut rules = vec![
        player.of(vec![Value::int(1).into()]).fact(),
        marker.of(vec![Value::int(1).into(), Value::int(0).into(), Value::int(1).into()]).fact(),
        marker.of(vec![Value::int(2).into(), Value::int(0).into(), Value::int(1).into()]).fact(),
        marker.of(vec![Value::int(3).into(), Value::int(0).into(), Value::int(1).into()]).fact(),
        marker.of(vec![Value::int(4).into(), Value::int(0).into(), Value::int(1).into()]).fact(),
    ];
    for col in 1i64..6 {
        rules.push(
            besides
                .of(vec![Value::int(col + 1).into(), Value::int(col).into()])
                .fact(),
        );
    }
    rules.push(
        winner.of(vec![p.clone().into()]).when(
            player
                .of(vec![p.clone().into()])
                .and(marker.of(vec![c1.clone().into(), r.clone().into(), p.clone().into()]))
                .and(besides.of(vec![c1.clone().into(), c2.clone().into()]))
                .and(besides.of(vec![c2.clone().into(), c3.clone().into()]))
                .and(besides.of(vec![c3.clone().into(), c4.clone().into()]))
                .and(marker.of(vec![c2.clone().into(), r.clone().into(), p.clone().into()]))
                .and(marker.of(vec![c3.clone().into(), r.clone().into(), p.clone().into()]))
                .and(marker.of(vec![c4.clone().into(), r.clone().into(), p.clone().into()])),
        ),
    );

    let program = Program::new(rules, FnMapping::new()).unwrap();
    let mut last_model = None;
    program
        .run_cb(Some(1), FnMapping::new(), true, |obs| last_model = obs.model.clone())
        .unwrap();
    let model = last_model.unwrap();

    let has_winner = model
        .iter()
        .any(|f| f.symbol == microlog::Symbol::Relation(winner.clone()) && f.args[0] == Value::int(1));
    assert!(has_winner);
}

/// A line-following loop: a `Call` reporting a light-sensor reading, an
/// unstratified relation testing it against a threshold, and a `Call`
/// steering the motor whose speed depends on whether the line is seen.
/// `onLine`'s body mixes a call literal with an oracle literal and no
/// plain relation literal, the shape that forces every unstratified
/// rule's head to get a guaranteed stratum regardless of body makeup.
#[test]
fn edge_follower_steers_by_sensor_reading() {
    let sensor = call(|_args: &[Value]| CallReturn::Tuple(vec![Value::int(10)]));
    let motor = call(|args: &[Value]| CallReturn::Single(args[0].clone()));
    let on_line = relation("onLine");
    let v = variable("V");

    let rules = vec![
        sensor.of(vec![]).at(TemporalAnnotation::Next).fact(),
        on_line
            .of(vec![])
            .when(sensor.of(vec![v.clone().into()]).and(v.lt(Value::int(20)))),
        motor
            .of(vec![Value::int(50).into()])
            .at(TemporalAnnotation::Next)
            .when(on_line.of(vec![])),
        motor
            .of(vec![Value::int(200).into()])
            .at(TemporalAnnotation::Next)
            .when(on_line.of(vec![]).negate()),
    ];

    let program = Program::new(rules, FnMapping::new()).unwrap();
    let mut ticks = Vec::new();
    program
        .run_cb(Some(2), FnMapping::new(), false, |obs| ticks.push(obs.io_facts.clone()))
        .unwrap();

    // Tick 0: sensor hasn't reported yet, so `onLine` can't hold; only the
    // sensor call fires. Tick 1: last tick's sensor reading (10 < 20) makes
    // `onLine` hold, so motor is driven at the "on line" speed.
    assert!(ticks[1].iter().any(|f| f.args.last() == Some(&Value::int(50))));
}

/// Two relations locked in mutual negation can never be stratified.
#[test]
fn mutually_negating_rules_are_rejected() {
    let p = relation("p");
    let q = relation("q");
    let x = variable("X");

    let rules = vec![
        p.of(vec![x.clone().into()]).when(q.of(vec![x.clone().into()]).negate()),
        q.of(vec![x.clone().into()]).when(p.of(vec![x.into()]).negate()),
    ];

    let err = Program::new(rules, FnMapping::new()).unwrap_err();
    assert!(matches!(err, ProgramError::UnstratifiableProgram(_)));
}

/// A three-layer dependency chain (`c` depends negatively on `b`, `b`
/// depends negatively on `a`) stratifies into three separate layers, each
/// evaluated in order. The first layer holds no unstratified rule at all
/// (`a` and `node` are plain facts, never unstratified rule heads) — the
/// peeling algorithm still emits it as its own stratum.
#[test]
fn chained_negation_yields_three_strata() {
    let a = relation("a");
    let b = relation("b");
    let c = relation("c");
    let node = relation("node");
    let x = variable("X");

    let rules = vec![
        a.of(vec![Value::int(1).into()]).fact(),
        node.of(vec![Value::int(1).into()]).fact(),
        node.of(vec![Value::int(2).into()]).fact(),
        b.of(vec![x.clone().into()]).when(node.of(vec![x.clone().into()]).and(a.of(vec![x.clone().into()]).negate())),
        c.of(vec![x.clone().into()]).when(node.of(vec![x.clone().into()]).and(b.of(vec![x.into()]).negate())),
    ];

    let program = Program::new(rules, FnMapping::new()).unwrap();
    assert_eq!(program.strata.len(), 3);
}
