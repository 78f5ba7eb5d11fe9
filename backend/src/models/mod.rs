mod mesken;
mod user;

pub use mesken::{
    LifecycleError, Mesken, MeskenChanges, MeskenStatus, NewMeskenRequest,
};
pub use user::{InvalidTckn, NewUser, Tckn, User};
