pub mod digest;
pub mod io;
pub mod pool;
