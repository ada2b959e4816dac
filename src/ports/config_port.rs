//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Keys present in `section`; empty when the section is absent.
    fn keys(&self, _section: &str) -> Vec<String> {
        Vec::new()
    }
}
