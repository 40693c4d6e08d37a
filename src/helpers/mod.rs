pub(crate) mod key;
pub(crate) mod string;
