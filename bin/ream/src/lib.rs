pub mod cli;
pub mod genesis;
pub mod ssz_file;
pub mod transition;
