pub mod prom;
