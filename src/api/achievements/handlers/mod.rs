mod list;
mod manage;
mod review;

pub(super) use list::{list_achievements, list_mine, review_queue, stats};
pub(super) use manage::{
    create_achievement, delete_achievement, get_achievement, history, update_achievement,
};
pub(super) use review::{approve, reject, reopen, revoke, submit, withdraw};
