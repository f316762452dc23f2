/// A requested change to one nullable field during an update.
///
/// A field absent from the request is `Keep`; a field sent as `null` or an
/// empty string is `Clear`; anything else is `Set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<T> {
    /// Leave the stored value untouched.
    Keep,
    /// Store NULL.
    Clear,
    /// Store the given value.
    Set(T),
}

impl<T> Default for Change<T> {
    fn default() -> Self {
        Change::Keep
    }
}

impl<T> Change<T> {
    /// True when the stored value will be written.
    pub fn is_write(&self) -> bool {
        !matches!(self, Change::Keep)
    }

    /// Maps the value of a `Set`.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Change<U> {
        match self {
            Change::Keep => Change::Keep,
            Change::Clear => Change::Clear,
            Change::Set(value) => Change::Set(f(value)),
        }
    }
}
