/// Common lifecycle surface shared by components and applications.
pub trait Lifecycle {
    fn initialize(&self);
    fn start(&self);
    fn stop(&self);
}
