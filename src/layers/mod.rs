pub mod bouncer;
pub mod detective;
pub mod judge;
