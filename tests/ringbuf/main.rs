mod common;
mod regions;
mod restart;
