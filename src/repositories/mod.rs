pub(crate) mod achievements;
pub(crate) mod health;
pub(crate) mod media;
pub(crate) mod reviews;
pub(crate) mod users;
