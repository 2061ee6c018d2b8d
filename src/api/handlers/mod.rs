pub mod health;
pub use self::health::health;

pub mod root;
pub use self::root::root;

pub mod secure;
pub use self::secure::secure;
