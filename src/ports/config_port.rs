//! Configuration access port trait.
//!
//! Every tunable is numeric. Getters fall back to the supplied default when a key is absent or does not
//! parse; range checks live in `domain::config_validation`.

pub trait ConfigPort {
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
}
