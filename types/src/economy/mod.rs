mod codec;
mod constants;
mod land;
mod redemption;
mod user;

pub use codec::{read_string, string_encode_size, write_string};
pub use constants::*;
pub use land::*;
pub use redemption::*;
pub use user::*;
