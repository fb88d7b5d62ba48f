mod common;

use std::sync::Arc;

use actionbus::{
    Address, Bus, Config, Dispatcher, Envelope, Generation, Node, Outcome, Registry, Telemetry,
    DEFAULT_DISPATCHER_ADDRESS,
};
use common::Inbox;

fn two_level(alpha: &Inbox, beta: &Inbox, cfg: &Config) -> (Bus, Dispatcher) {
    let (bus, rx) = Bus::new(32);
    let registry = Arc::new(Registry::new());
    registry.load("1 Alpha\n12 Beta\n").unwrap();
    let tree = vec![Node::new("Alpha", 1)
        .with_component(alpha.clone())
        .with_child(Node::new("Beta", 1).with_component(beta.clone()))];
    let mut d = Dispatcher::new(cfg, bus.clone(), rx, registry, Telemetry::default(), tree);
    d.resolve_addresses();
    (bus, d)
}

#[test]
fn test_target_reaches_only_its_router() {
    let (alpha, beta) = (Inbox::default(), Inbox::default());
    let (bus, mut d) = two_level(&alpha, &beta, &Config::default());
    assert_eq!(d.address(), DEFAULT_DISPATCHER_ADDRESS);
    assert_eq!(d.children()[0].address(), Address::new(1));

    bus.enqueue(Envelope::new(Address::new(12), Address::new(1), "PRINT to beta"))
        .unwrap();
    assert_eq!(
        d.dispatch_next(),
        Some(Outcome::Delivered { to: Address::new(12) })
    );
    assert_eq!(beta.payloads(), vec!["PRINT to beta"]);
    assert!(alpha.payloads().is_empty());

    bus.enqueue(Envelope::new(Address::new(1), Address::new(12), "PRINT to alpha"))
        .unwrap();
    d.dispatch_next();
    assert_eq!(alpha.payloads(), vec!["PRINT to alpha"]);
}

#[test]
fn test_unmatched_target_comes_back_to_origin() {
    let (alpha, beta) = (Inbox::default(), Inbox::default());
    let (bus, mut d) = two_level(&alpha, &beta, &Config::default());

    bus.enqueue(Envelope::new(Address::new(999), Address::new(1), "PRINT lost"))
        .unwrap();
    assert_eq!(
        d.dispatch_next(),
        Some(Outcome::Bounced { by: DEFAULT_DISPATCHER_ADDRESS })
    );
    d.dispatch_next();

    let got = alpha.envelopes();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].target, Address::new(1));
    assert_eq!(got[0].origin, DEFAULT_DISPATCHER_ADDRESS);
    assert_eq!(got[0].error_count, 1);
    assert_eq!(got[0].payload, "PRINT lost UNRESOLVED 999");
}

#[test]
fn test_bounce_below_a_router_is_attributed_to_it() {
    let (alpha, beta) = (Inbox::default(), Inbox::default());
    let (bus, mut d) = two_level(&alpha, &beta, &Config::default());

    bus.enqueue(Envelope::new(Address::new(17), Address::new(12), "PRINT x"))
        .unwrap();
    assert_eq!(
        d.dispatch_next(),
        Some(Outcome::Bounced { by: Address::new(1) })
    );
    d.dispatch_next();
    let got = beta.envelopes();
    assert_eq!(got[0].origin, Address::new(1));
    assert_eq!(got[0].error_count, 1);
}

#[test]
fn test_bounce_ceiling_ends_a_bounce_loop() {
    let cfg = Config {
        strict_verbs: true,
        ..Config::default()
    };
    let (alpha, beta) = (Inbox::default(), Inbox::default());
    let (bus, mut d) = two_level(&alpha, &beta, &cfg);

    bus.enqueue(Envelope::new(Address::new(999), Address::new(998), "PING"))
        .unwrap();
    d.drain();

    let report = d.report();
    assert_eq!(report.bounced, u64::from(cfg.max_bounces));
    assert_eq!(report.dropped, 1);
    assert_eq!(d.pending(), 0);
}

#[test]
fn test_unbounded_bounces_without_ceiling() {
    let cfg = Config {
        strict_verbs: true,
        max_bounces: 0,
        ..Config::default()
    };
    let (alpha, beta) = (Inbox::default(), Inbox::default());
    let (bus, mut d) = two_level(&alpha, &beta, &cfg);

    bus.enqueue(Envelope::new(Address::new(999), Address::new(998), "PING"))
        .unwrap();
    for _ in 0..50 {
        assert!(matches!(d.dispatch_next(), Some(Outcome::Bounced { .. })));
    }
    assert_eq!(d.pending(), 1);
}

#[test]
fn test_table_round_trip() {
    let pairs: Vec<(i64, String)> = (1..=9).map(|i| (i * 10 + i, format!("Unit{i}"))).collect();
    let source: String = pairs.iter().map(|(a, n)| format!("{a} {n}\n")).collect();

    let registry = Registry::new();
    assert_eq!(registry.load(&source).unwrap(), pairs.len());
    for (addr, name) in &pairs {
        assert_eq!(registry.address_of(name), Address::new(*addr));
        assert_eq!(
            registry.name_of(Address::new(*addr), Generation::Current).as_deref(),
            Some(name.as_str())
        );
    }
}
