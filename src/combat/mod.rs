pub mod damage;
pub mod economy;
pub mod rejection;
