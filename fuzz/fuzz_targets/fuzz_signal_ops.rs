#![no_main]

use std::any::Any;
use std::cell::RefCell;

use arbitrary::Arbitrary;
use connections::{ScopedConnection, Signal};
use libfuzzer_sys::fuzz_target;

const CAPACITY: usize = 8;

#[derive(Arbitrary, Debug)]
enum FuzzOp {
    Connect { context: u8 },
    Once { context: u8 },
    Scoped { context: u8 },
    DropScoped,
    Disconnect { nth: u8 },
    ByContext { context: u8 },
    All,
    Fire(u16),
    Suspend,
    Resume,
}

struct Tag {
    id: u8,
    log: RefCell<Vec<u8>>,
}

fn push(ctx: &dyn Any, _: u16) {
    if let Some(tag) = ctx.downcast_ref::<Tag>() {
        tag.log.borrow_mut().push(tag.id);
    }
}

fuzz_target!(|ops: Vec<FuzzOp>| {
    let tags: Vec<Tag> = (0..4)
        .map(|id| Tag {
            id,
            log: RefCell::new(Vec::new()),
        })
        .collect();
    let signal: Signal<'_, u16, CAPACITY> = Signal::new();
    let mut guards: Vec<ScopedConnection<'_, '_, u16>> = Vec::new();
    let tag = |context: u8| &tags[usize::from(context % 4)];

    for op in ops.iter().take(512) {
        let before = signal.connection_count();
        match *op {
            FuzzOp::Connect { context } => {
                let result = signal.connect(push, tag(context));
                assert_eq!(result.is_some(), before < CAPACITY);
            }
            FuzzOp::Once { context } => {
                let result = signal.once(push, tag(context));
                assert_eq!(result.is_some(), before < CAPACITY);
            }
            FuzzOp::Scoped { context } => {
                if let Some(connection) = signal.connect(push, tag(context)) {
                    guards.push(connection.scoped());
                }
            }
            FuzzOp::DropScoped => {
                guards.pop();
            }
            FuzzOp::Disconnect { nth } => {
                if let Some(connection) = signal.iter().nth(usize::from(nth)) {
                    connection.disconnect();
                    assert_eq!(signal.connection_count(), before - 1);
                }
            }
            FuzzOp::ByContext { context } => {
                let removed = signal.disconnect_by_context(tag(context));
                assert_eq!(signal.connection_count(), before - removed);
            }
            FuzzOp::All => {
                assert_eq!(signal.disconnect_all(), before);
            }
            FuzzOp::Fire(value) => {
                let onces = signal.iter().filter(|c| c.is_once()).count();
                let calls_before: usize = tags.iter().map(|t| t.log.borrow().len()).sum();
                signal.fire(value);
                let calls_after: usize = tags.iter().map(|t| t.log.borrow().len()).sum();
                if signal.is_active() {
                    assert_eq!(calls_after - calls_before, before);
                    assert_eq!(signal.connection_count(), before - onces);
                } else {
                    assert_eq!(calls_after, calls_before);
                    assert_eq!(signal.connection_count(), before);
                }
            }
            FuzzOp::Suspend => signal.suspend(),
            FuzzOp::Resume => signal.resume(),
        }
        assert!(signal.connection_count() <= CAPACITY);
    }

    drop(guards);
});
