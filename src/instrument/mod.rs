//! The `funparam` instrument.
//!
//! A test receives a [`Funparam`] and uses it to wrap verification functions:
//!
//! ```rust
//! use funparam::Funparam;
//!
//! let funparam = Funparam::recording();
//! let verify_sum = funparam.wrap(|(a, b, expected): (i32, i32, i32)| assert_eq!(a + b, expected));
//! verify_sum.call((1, 2, 3));
//! verify_sum.call((2, 2, 4));
//!
//! let recording = funparam.as_recording().unwrap();
//! assert_eq!(recording.generate_params().len(), 2);
//! ```
//!
//! The same test body sees two kinds of instrument:
//! - [`RecordingFunparam`] during the single dry run: calls are logged, never executed.
//! - [`ReplayFunparam`] during each generated case: only the call whose ordinal matches the case runs.
//!
//! Wrapping mints a [`CallKey`] and stores the original function in the instrument's registry. The
//! returned [`Verifier`] only carries the key, so the instrument alone decides what a call does.

mod recording;
mod replay;

pub use recording::{CallRecord, CaseParam, RecordingFunparam};
pub use replay::ReplayFunparam;

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::errors::{FunparamError, raise};
use crate::marks::Mark;

/// Token identifying one wrapped verification function within one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallKey(u64);

/// The engine-reserved options of a verification call.
///
/// They are never forwarded to the verification function; they only shape the generated case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    pub marks: Vec<Mark>,
    pub id: Option<String>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display id of the generated case, instead of its ordinal.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }
}

/// Original verification functions by key.
#[derive(Default)]
pub(crate) struct VerifyFunctions {
    next_key: u64,
    functions: HashMap<CallKey, Box<dyn Any>>,
}

impl VerifyFunctions {
    fn insert<A: 'static>(&mut self, function: Rc<dyn Fn(A)>) -> CallKey {
        let key = CallKey(self.next_key);
        self.next_key += 1;
        self.functions.insert(key, Box::new(function));
        key
    }

    pub(crate) fn get<A: 'static>(&self, key: CallKey) -> Option<Rc<dyn Fn(A)>> {
        self.functions.get(&key)?.downcast_ref::<Rc<dyn Fn(A)>>().cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.functions.len()
    }
}

pub(crate) enum Instrument {
    Recording(RecordingFunparam),
    Replay(ReplayFunparam),
}

impl Instrument {
    fn verify_functions(&self) -> &RefCell<VerifyFunctions> {
        match self {
            Instrument::Recording(recording) => &recording.verify_functions,
            Instrument::Replay(replay) => &replay.verify_functions,
        }
    }
}

/// The value of the `funparam` fixture.
///
/// Cloning yields another handle to the same instrument.
#[derive(Clone)]
pub struct Funparam {
    inner: Rc<Instrument>,
}

impl Funparam {
    /// An instrument for the dry run.
    pub fn recording() -> Self {
        Self {
            inner: Rc::new(Instrument::Recording(RecordingFunparam::default())),
        }
    }

    /// An instrument for the generated case with ordinal `target_index`.
    pub fn replay(target_index: usize) -> Self {
        Self {
            inner: Rc::new(Instrument::Replay(ReplayFunparam::new(target_index))),
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(*self.inner, Instrument::Recording(_))
    }

    pub fn as_recording(&self) -> Option<&RecordingFunparam> {
        match &*self.inner {
            Instrument::Recording(recording) => Some(recording),
            Instrument::Replay(_) => None,
        }
    }

    pub fn as_replay(&self) -> Option<&ReplayFunparam> {
        match &*self.inner {
            Instrument::Replay(replay) => Some(replay),
            Instrument::Recording(_) => None,
        }
    }

    /// Number of verification functions wrapped through this instrument so far.
    pub fn wrapped_count(&self) -> usize {
        self.inner.verify_functions().borrow().len()
    }

    /// Wrap a verification function.
    pub fn wrap<A, F>(&self, verify_function: F) -> Verifier<A>
    where
        A: fmt::Debug + 'static,
        F: Fn(A) + 'static,
    {
        self.decorator().wrap(verify_function)
    }

    /// Start a configurable wrap; with no configuration this is the same as [`Funparam::wrap`].
    pub fn decorator(&self) -> Decorator {
        Decorator {
            funparam: self.clone(),
            marks: Vec::new(),
        }
    }

    fn call_verify_function<A: fmt::Debug + 'static>(&self, key: CallKey, args: A, options: CallOptions) {
        match &*self.inner {
            Instrument::Recording(recording) => recording.call_verify_function(key, &args, options),
            Instrument::Replay(replay) => replay.call_verify_function(key, args),
        }
    }
}

impl fmt::Debug for Funparam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.inner {
            Instrument::Recording(recording) => f
                .debug_struct("Funparam::Recording")
                .field("calls", &recording.call_count())
                .finish(),
            Instrument::Replay(replay) => f
                .debug_struct("Funparam::Replay")
                .field("target_index", &replay.target_index())
                .field("current_call_number", &replay.current_call_number())
                .finish(),
        }
    }
}

/// A pending wrap with configuration.
pub struct Decorator {
    funparam: Funparam,
    marks: Vec<Mark>,
}

impl Decorator {
    /// Marks added to every case generated from this verifier.
    pub fn marks(mut self, marks: impl IntoIterator<Item = Mark>) -> Self {
        self.marks.extend(marks);
        self
    }

    pub fn wrap<A, F>(self, verify_function: F) -> Verifier<A>
    where
        A: fmt::Debug + 'static,
        F: Fn(A) + 'static,
    {
        let function: Rc<dyn Fn(A)> = Rc::new(verify_function);
        let key = self.funparam.inner.verify_functions().borrow_mut().insert(function);
        Verifier {
            instrument: Rc::downgrade(&self.funparam.inner),
            key,
            default_marks: self.marks.into(),
            _args: PhantomData,
        }
    }
}

/// A wrapped verification function taking `A`.
///
/// Use a tuple (or a struct) for `A` when the function needs several arguments.
pub struct Verifier<A> {
    instrument: Weak<Instrument>,
    key: CallKey,
    default_marks: Rc<[Mark]>,
    _args: PhantomData<fn(A)>,
}

impl<A> Clone for Verifier<A> {
    fn clone(&self) -> Self {
        Self {
            instrument: self.instrument.clone(),
            key: self.key,
            default_marks: self.default_marks.clone(),
            _args: PhantomData,
        }
    }
}

impl<A> fmt::Debug for Verifier<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier").field("key", &self.key).finish()
    }
}

impl<A: fmt::Debug + 'static> Verifier<A> {
    pub fn key(&self) -> CallKey {
        self.key
    }

    #[track_caller]
    pub fn call(&self, args: A) {
        self.call_with(args, CallOptions::default());
    }

    /// Call with marks and/or an id for the generated case.
    #[track_caller]
    pub fn call_with(&self, args: A, options: CallOptions) {
        let Some(inner) = self.instrument.upgrade() else {
            raise(FunparamError::UnregisteredVerifier)
        };
        let options = if self.default_marks.is_empty() {
            options
        } else {
            let mut marks = self.default_marks.to_vec();
            marks.extend(options.marks);
            CallOptions { marks, id: options.id }
        };
        Funparam { inner }.call_verify_function(self.key, args, options);
    }
}
