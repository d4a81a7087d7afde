use super::TreeView;
use ptree::TreeItem;
use std::borrow::Cow;

impl TreeView {
    pub fn new(label: String, children: Vec<TreeView>) -> Self {
        Self { label, children }
    }

    pub fn leaf(label: String) -> Self {
        TreeView::new(label, Vec::with_capacity(0))
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Print self on the standard output.
    pub fn print(&self) -> std::io::Result<()> {
        ptree::print_tree(self)
    }
}

impl TreeItem for TreeView {
    type Child = TreeView;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(&self.children[..])
    }
}
