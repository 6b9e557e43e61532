//! The per-case instrument.
//!
//! State machine: `IDLE -> INSIDE_CALL` when the call matching the target ordinal starts, back to `IDLE` when
//! it returns or unwinds. Entering any verification call while `INSIDE_CALL` is a usage error and is raised
//! at the nested call site.

use std::cell::{Cell, RefCell};

use super::{CallKey, VerifyFunctions};
use crate::errors::{FunparamError, raise};

/// Executes only the verification call whose ordinal equals `target_index`.
pub struct ReplayFunparam {
    pub(crate) verify_functions: RefCell<VerifyFunctions>,
    target_index: usize,
    current_call_number: Cell<usize>,
    inside_call: Cell<bool>,
}

impl ReplayFunparam {
    pub fn new(target_index: usize) -> Self {
        Self {
            verify_functions: RefCell::default(),
            target_index,
            current_call_number: Cell::new(0),
            inside_call: Cell::new(false),
        }
    }

    pub fn target_index(&self) -> usize {
        self.target_index
    }

    /// Number of verification calls seen so far in this run.
    pub fn current_call_number(&self) -> usize {
        self.current_call_number.get()
    }

    pub fn is_inside_call(&self) -> bool {
        self.inside_call.get()
    }

    #[track_caller]
    pub(crate) fn call_verify_function<A: 'static>(&self, key: CallKey, args: A) {
        if self.inside_call.get() {
            raise(FunparamError::nested());
        }
        let _exit = CallExit { replay: self };

        let call_number = self.current_call_number.get();
        if call_number != self.target_index {
            tracing::trace!(call_number, target = self.target_index, "skipped verification call");
            return;
        }

        let Some(verify_function) = self.verify_functions.borrow().get::<A>(key) else {
            raise(FunparamError::UnregisteredVerifier)
        };
        tracing::trace!(call_number, "executing verification call");
        self.inside_call.set(true);
        verify_function(args);
    }
}

/// Advances the counter and leaves `INSIDE_CALL` on every exit path, including unwinding.
struct CallExit<'a> {
    replay: &'a ReplayFunparam,
}

impl Drop for CallExit<'_> {
    fn drop(&mut self) {
        let replay = self.replay;
        replay.current_call_number.set(replay.current_call_number.get() + 1);
        replay.inside_call.set(false);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::rc::Rc;

    use crate::errors::FunparamError;
    use crate::instrument::Funparam;

    fn run_three_calls(target: usize) -> (Vec<i32>, Funparam) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let funparam = Funparam::replay(target);
        let verify = funparam.wrap(move |n: i32| sink.borrow_mut().push(n));
        verify.call(10);
        verify.call(20);
        verify.call(30);
        let seen = seen.borrow().clone();
        (seen, funparam)
    }

    #[test]
    fn only_the_target_call_executes() {
        for (target, expected) in [(0, 10), (1, 20), (2, 30)] {
            let (seen, funparam) = run_three_calls(target);
            assert_eq!(seen, vec![expected]);
            assert_eq!(funparam.as_replay().unwrap().current_call_number(), 3);
        }
    }

    #[test]
    fn out_of_range_target_executes_nothing() {
        let (seen, _) = run_three_calls(7);
        assert!(seen.is_empty());
    }

    #[test]
    fn failing_call_still_advances_counter_and_clears_flag() {
        let funparam = Funparam::replay(0);
        let verify = funparam.wrap(|(a, b, c): (i32, i32, i32)| assert_eq!(a + b, c));

        let caught = catch_unwind(AssertUnwindSafe(|| verify.call((2, 2, 5))));
        assert!(caught.is_err());

        let replay = funparam.as_replay().unwrap();
        assert_eq!(replay.current_call_number(), 1);
        assert!(!replay.is_inside_call());

        // Later calls are skipped normally.
        verify.call((2, 2, 5));
        assert_eq!(replay.current_call_number(), 2);
    }

    #[test]
    fn nested_call_raises_nesting_violation() {
        let funparam = Funparam::replay(0);
        let inner = funparam.wrap(|_: i32| {});
        let outer = funparam.wrap(move |n: i32| inner.call(n));

        let payload = catch_unwind(AssertUnwindSafe(|| outer.call(1))).unwrap_err();
        let err = payload.downcast_ref::<FunparamError>().unwrap();
        assert!(matches!(err, FunparamError::NestedFunparam { .. }));
        assert!(err.to_string().contains("'funparam'"));

        let replay = funparam.as_replay().unwrap();
        assert!(!replay.is_inside_call());
        // The nested call never entered, so only the outer call advanced the counter.
        assert_eq!(replay.current_call_number(), 1);
    }

    #[test]
    fn nested_call_in_skipped_outer_is_never_reached() {
        let funparam = Funparam::replay(1);
        let inner = funparam.wrap(|_: i32| {});
        let outer = funparam.wrap(move |n: i32| inner.call(n));
        let plain = funparam.wrap(|_: i32| {});

        outer.call(1);
        plain.call(2);
        assert_eq!(funparam.as_replay().unwrap().current_call_number(), 2);
    }
}
