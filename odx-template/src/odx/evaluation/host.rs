//! The host interface driven by the interpreter and the program VM

/// Receiver of the evaluation walk
///
/// Calls always nest: `begin_object` / `end_object` pairs bracket the top level and every
/// list item, and `begin_list` / `end_list` bracket a list's items. `begin_list` returns
/// the number of items to walk; the caller then opens one object per item, passing its
/// index.
pub trait Host {
    /// `None` for the top-level object, `Some(i)` for item `i` of the current list
    fn begin_object(&mut self, index: Option<usize>);
    fn end_object(&mut self);
    fn define(&mut self, atom: &str, expr: &str);
    fn begin_condition(&mut self, atom: &str, expr: &str) -> bool;
    fn begin_list(&mut self, atom: &str, expr: &str) -> usize;
    fn end_list(&mut self);
}

impl<H: Host + ?Sized> Host for &mut H {
    fn begin_object(&mut self, index: Option<usize>) {
        (**self).begin_object(index)
    }

    fn end_object(&mut self) {
        (**self).end_object()
    }

    fn define(&mut self, atom: &str, expr: &str) {
        (**self).define(atom, expr)
    }

    fn begin_condition(&mut self, atom: &str, expr: &str) -> bool {
        (**self).begin_condition(atom, expr)
    }

    fn begin_list(&mut self, atom: &str, expr: &str) -> usize {
        (**self).begin_list(atom, expr)
    }

    fn end_list(&mut self) {
        (**self).end_list()
    }
}
