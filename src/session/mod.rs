pub(crate) mod edit_session;
pub(crate) mod opts;
pub(crate) mod outcome;
