//! Message trait for routable messages.

/// A message that can be routed by subject.
///
/// The router reads [`subject`](Message::subject) and nothing else; the raw
/// transport message is carried through to handlers untouched.
///
/// # Example
///
/// ```rust
/// use subroute_core::{Message, SubjectMsg};
///
/// let msg = SubjectMsg::new("orders.created.eu", vec![1_u8, 2, 3]);
/// assert_eq!(msg.subject(), "orders.created.eu");
/// assert_eq!(msg.raw(), &[1, 2, 3]);
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a routable Message",
    label = "missing `Message` implementation",
    note = "Messages expose a subject and must be `Send + Sync + 'static`."
)]
pub trait Message: Send + Sync + 'static {
    /// The underlying transport message.
    type Raw: ?Sized;

    /// The dot-delimited subject used for routing.
    fn subject(&self) -> &str;

    /// The underlying transport message.
    fn raw(&self) -> &Self::Raw;
}

/// A subject paired with the transport message it arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectMsg<T = ()> {
    subject: String,
    raw: T,
}

impl<T> SubjectMsg<T> {
    /// Wrap a transport message under `subject`.
    pub fn new(subject: impl Into<String>, raw: T) -> Self {
        Self {
            subject: subject.into(),
            raw,
        }
    }

    /// Unwrap the transport message.
    pub fn into_raw(self) -> T {
        self.raw
    }
}

impl SubjectMsg<()> {
    /// A message with a subject and nothing else.
    pub fn from_subject(subject: impl Into<String>) -> Self {
        Self::new(subject, ())
    }
}

impl<T: Send + Sync + 'static> Message for SubjectMsg<T> {
    type Raw = T;

    fn subject(&self) -> &str {
        &self.subject
    }

    fn raw(&self) -> &T {
        &self.raw
    }
}

// Bare subjects
impl Message for String {
    type Raw = str;

    fn subject(&self) -> &str {
        self
    }

    fn raw(&self) -> &str {
        self
    }
}

impl Message for &'static str {
    type Raw = str;

    fn subject(&self) -> &str {
        self
    }

    fn raw(&self) -> &str {
        self
    }
}
