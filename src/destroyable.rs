// implemented by owners of subscriptions or scheduled tasks that must be released explicitly
pub trait Destroyable {
    fn destroy(&mut self);
}
