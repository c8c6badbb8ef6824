//! End-to-end tour of the broker: hierarchy dispatch, predicates, hooks, and
//! a transactional publish over a fake connection.
//!
//! Run with: `cargo run --example audit_trail`

use std::sync::atomic::{AtomicBool, Ordering};

use cascade::{
    Broker, Event, EventPayload, Handler, ResourceError, SharedResource, TransactionScope,
};

#[derive(Debug)]
struct AppEvent;
impl Event for AppEvent {
    type Parent = AppEvent;
}

#[derive(Debug)]
struct OrderEvent {
    order_id: u64,
}
impl Event for OrderEvent {
    type Parent = AppEvent;
}

#[derive(Debug)]
struct OrderShipped {
    order_id: u64,
    carrier: &'static str,
}
impl Event for OrderShipped {
    type Parent = OrderEvent;
}

struct FakeConnection {
    open: AtomicBool,
}

impl SharedResource for FakeConnection {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn open(&self) -> Result<(), ResourceError> {
        println!("  [conn] opened");
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> Result<(), ResourceError> {
        println!("  [conn] closed");
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct ConsoleScope {
    outcome: Option<&'static str>,
}

impl TransactionScope for ConsoleScope {
    fn complete(&mut self) {
        self.outcome = Some("committed");
    }

    fn rollback(&mut self) {
        self.outcome = Some("rolled back");
    }
}

fn main() {
    let broker = Broker::new();

    // Audit every payload that reaches dispatch.
    broker.publishing().attach(|_, payload| {
        println!("  [audit] publishing {}", payload.event_name());
    });
    broker.published().attach(|_, payload| {
        println!("  [audit] published  {}", payload.event_name());
    });

    // Cross-cutting handler on the hierarchy root.
    broker.subscribe::<AppEvent>(Handler::closure(|_, payload| {
        println!("  [app] saw {}", payload.event_name());
        Ok(())
    }));

    // Narrow handler, fires first for OrderShipped payloads.
    broker.subscribe::<OrderShipped>(Handler::closure(|_, payload| {
        let shipped = payload.downcast_ref::<OrderShipped>().unwrap();
        println!(
            "  [shipping] order {} handed to {}",
            shipped.order_id, shipped.carrier
        );
        Ok(())
    }));

    // Predicate-gated handler on the middle level.
    broker.subscribe_where::<OrderEvent>(
        |payload| {
            payload
                .downcast_ref::<OrderShipped>()
                .is_some_and(|e| e.carrier == "albatross-express")
        },
        Handler::closure(|_, _| {
            println!("  [alerts] premium carrier engaged");
            Ok(())
        }),
    );

    println!("plain publish:");
    broker
        .publish(
            &"demo",
            Some(&OrderShipped {
                order_id: 41,
                carrier: "albatross-express",
            }),
        )
        .expect("publish failed");

    println!("transactional publish:");
    let connection = FakeConnection {
        open: AtomicBool::new(false),
    };
    let mut scope = ConsoleScope::default();
    broker
        .publish_in_transaction(
            &"demo",
            Some(&OrderEvent { order_id: 42 }),
            &mut scope,
            &[&connection],
        )
        .expect("transactional publish failed");
    println!("  [scope] {}", scope.outcome.unwrap());

    // A failing handler aborts dispatch and rolls the scope back.
    let flaky = Handler::closure(|_, _| Err("downstream unavailable".into()));
    broker.subscribe::<OrderEvent>(flaky.clone());

    println!("failing transactional publish:");
    let mut scope = ConsoleScope::default();
    let err = broker
        .publish_in_transaction(
            &"demo",
            Some(&OrderEvent { order_id: 43 }),
            &mut scope,
            &[&connection],
        )
        .unwrap_err();
    println!("  [caller] error: {err}");
    println!("  [scope] {}", scope.outcome.unwrap());

    broker.unsubscribe(&flaky);
}
