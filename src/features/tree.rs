use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::mem;

use super::bid::Bid;

type Link = Option<Box<Node>>;

/// A tree node. Each node exclusively owns both of its subtrees.
struct Node {
    bid: Bid,
    left: Link,
    right: Link,
}

impl Node {
    fn new(bid: Bid) -> Box<Self> {
        Box::new(Self {
            bid,
            left: None,
            right: None,
        })
    }
}

/// Order in which a traversal visits the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Left subtree, node, right subtree. Yields bids sorted by id.
    InOrder,

    /// Node, left subtree, right subtree. Reflects the shape the insertions produced.
    PreOrder,

    /// Left subtree, right subtree, node.
    PostOrder,
}

/// Unbalanced binary search tree of bids keyed by bid id.
///
/// Keys in a node's left subtree are strictly less than the node's key, keys in
/// its right subtree are greater or equal. Nothing keeps the tree balanced, so
/// inserting ids in ascending order produces a right-leaning chain. Every walk
/// is iterative, which keeps such chains from exhausting the call stack.
#[derive(Default)]
pub struct BinarySearchTree {
    root: Link,
    len: usize,
}

impl BinarySearchTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bids in the tree
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of nodes on the longest path from the root to a leaf.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut pending: Vec<(&Node, usize)> =
            self.root.as_deref().map(|n| (n, 1)).into_iter().collect();

        while let Some((node, depth)) = pending.pop() {
            height = height.max(depth);
            pending.extend(node.left.as_deref().map(|n| (n, depth + 1)));
            pending.extend(node.right.as_deref().map(|n| (n, depth + 1)));
        }
        height
    }

    /// Insert a bid below the first free slot on its search path.
    ///
    /// A bid whose id equals an existing one goes to the right of it, so
    /// duplicate ids are kept side by side rather than replaced.
    pub fn insert(&mut self, bid: Bid) {
        let mut slot = &mut self.root;
        while let Some(node) = slot {
            slot = if bid.id() < node.bid.id() {
                &mut node.left
            } else {
                &mut node.right
            };
        }

        trace!("inserting bid {}", bid.id());
        *slot = Some(Node::new(bid));
        self.len += 1;
    }

    /// Find the bid with the given id.
    pub fn search(&self, id: &str) -> Option<&Bid> {
        let mut current = self.root.as_deref();

        while let Some(node) = current {
            current = match id.cmp(node.bid.id().as_str()) {
                Ordering::Equal => return Some(&node.bid),
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
            };
        }
        None
    }

    /// Remove the bid with the given id and return it. Removing an id that is
    /// not in the tree leaves the tree untouched and returns `None`.
    ///
    /// When several bids share the id, the one nearest the root is removed.
    /// Which of the duplicates that is depends on insertion and removal
    /// history, not on any property of the bids themselves.
    ///
    /// A node with two children stays in place: the bid of its in-order
    /// successor is moved into it and the successor node is unlinked instead.
    pub fn remove(&mut self, id: &str) -> Option<Bid> {
        let mut slot = &mut self.root;
        loop {
            let go_left = match slot.as_deref() {
                None => {
                    debug!("bid {id} not in tree, nothing removed");
                    return None;
                }
                Some(node) => match id.cmp(node.bid.id().as_str()) {
                    Ordering::Equal => break,
                    Ordering::Less => true,
                    Ordering::Greater => false,
                },
            };
            let node = slot.as_mut()?;
            slot = if go_left { &mut node.left } else { &mut node.right };
        }

        let node = slot.as_deref_mut()?;
        let removed = if node.left.is_some() && node.right.is_some() {
            let successor = detach_min(&mut node.right)?;
            trace!("promoting successor {} into place of {id}", successor.id());
            mem::replace(&mut node.bid, successor)
        } else {
            let Node { bid, left, right } = *slot.take()?;
            *slot = left.or(right);
            bid
        };

        self.len -= 1;
        Some(removed)
    }

    /// Release every node. The tree stays usable and is empty afterwards.
    pub fn clear(&mut self) {
        let mut pending: Vec<Box<Node>> = self.root.take().into_iter().collect();

        while let Some(mut node) = pending.pop() {
            pending.extend(node.left.take());
            pending.extend(node.right.take());
        }
        self.len = 0;
    }

    /// Visit every bid in the given order.
    pub fn traverse(&self, order: TraversalOrder) -> Traversal<'_> {
        Traversal {
            order,
            stack: self.root.as_deref().map(Step::Expand).into_iter().collect(),
        }
    }

    /// Bids in ascending id order
    pub fn iter(&self) -> Traversal<'_> {
        self.traverse(TraversalOrder::InOrder)
    }
}

/// Unlink the leftmost node under `slot`, splice its right subtree into its
/// place, and hand back its bid.
fn detach_min(mut slot: &mut Link) -> Option<Bid> {
    while slot.as_ref()?.left.is_some() {
        slot = &mut slot.as_mut()?.left;
    }

    let Node { bid, right, .. } = *slot.take()?;
    *slot = right;
    Some(bid)
}

impl Drop for BinarySearchTree {
    fn drop(&mut self) {
        // Drop glue for `Link` recurses once per level
        self.clear();
    }
}

impl fmt::Debug for BinarySearchTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Extend<Bid> for BinarySearchTree {
    fn extend<I: IntoIterator<Item = Bid>>(&mut self, bids: I) {
        for bid in bids {
            self.insert(bid);
        }
    }
}

impl FromIterator<Bid> for BinarySearchTree {
    fn from_iter<I: IntoIterator<Item = Bid>>(bids: I) -> Self {
        let mut tree = Self::new();
        tree.extend(bids);
        tree
    }
}

impl<'a> IntoIterator for &'a BinarySearchTree {
    type Item = &'a Bid;
    type IntoIter = Traversal<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

enum Step<'a> {
    Expand(&'a Node),
    Yield(&'a Bid),
}

/// Borrowing iterator over the bids of a [`BinarySearchTree`].
///
/// Pending work lives on a heap stack, so depth of the tree is bounded only by
/// memory. Created by [`BinarySearchTree::traverse`].
pub struct Traversal<'a> {
    order: TraversalOrder,
    stack: Vec<Step<'a>>,
}

impl<'a> Traversal<'a> {
    fn expand(&mut self, node: &'a Node) {
        let left = node.left.as_deref().map(Step::Expand);
        let right = node.right.as_deref().map(Step::Expand);
        let this = Some(Step::Yield(&node.bid));

        // Pushed in reverse, the stack pops them in visiting order
        let steps = match self.order {
            TraversalOrder::InOrder => [right, this, left],
            TraversalOrder::PreOrder => [right, left, this],
            TraversalOrder::PostOrder => [this, right, left],
        };
        self.stack.extend(steps.into_iter().flatten());
    }
}

impl<'a> Iterator for Traversal<'a> {
    type Item = &'a Bid;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(step) = self.stack.pop() {
            match step {
                Step::Yield(bid) => return Some(bid),
                Step::Expand(node) => self.expand(node),
            }
        }
        None
    }
}

impl FusedIterator for Traversal<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use test_case::test_case;

    fn bid(id: &str) -> Bid {
        Bid::new(id, format!("Item {id}"), "General Fund", Decimal::new(100, 2))
    }

    fn tree_of(ids: &[&str]) -> BinarySearchTree {
        ids.iter().map(|id| bid(id)).collect()
    }

    fn ids(tree: &BinarySearchTree, order: TraversalOrder) -> Vec<String> {
        tree.traverse(order)
            .map(|bid| bid.id().to_string())
            .collect()
    }

    fn root_id(tree: &BinarySearchTree) -> Option<&str> {
        tree.root.as_ref().map(|node| node.bid.id().as_str())
    }

    /// Ids 0..n zero padded and shuffled, so larger trees get a bushy shape.
    fn scrambled_ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{:05}", (i * 7919) % n)).collect()
    }

    const SEVEN: [&str; 7] = ["5", "3", "8", "1", "4", "7", "9"];

    #[test]
    fn empty_tree() {
        let tree = BinarySearchTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.search("98223"), None);
        assert_eq!(tree.iter().count(), 0);
    }

    #[test]
    fn insert_then_search_returns_the_same_bid() {
        let tree = tree_of(&["98223", "98222", "98224"]);
        for id in ["98223", "98222", "98224"] {
            assert_eq!(tree.search(id), Some(&bid(id)));
        }
        assert_eq!(tree.len(), 3);
    }

    #[test_case(&["98223", "98222", "98224"], "98221" ; "below the minimum")]
    #[test_case(&["98223", "98222", "98224"], "982225" ; "between keys")]
    #[test_case(&["98223", "98222", "98224"], "" ; "empty id")]
    #[test_case(&[], "1" ; "empty tree")]
    fn search_for_missing_id_is_none(inserted: &[&str], missing: &str) {
        assert_eq!(tree_of(inserted).search(missing), None);
    }

    #[test]
    fn in_order_sorts_by_id() {
        let tree = tree_of(&["98223", "98222", "98224"]);
        assert_eq!(
            ids(&tree, TraversalOrder::InOrder),
            ["98222", "98223", "98224"]
        );
    }

    #[test_case(TraversalOrder::InOrder, &["1", "3", "4", "5", "7", "8", "9"] ; "in order")]
    #[test_case(TraversalOrder::PreOrder, &["5", "3", "1", "4", "8", "7", "9"] ; "pre order")]
    #[test_case(TraversalOrder::PostOrder, &["1", "4", "3", "7", "9", "8", "5"] ; "post order")]
    fn traversal_orders(order: TraversalOrder, expected: &[&str]) {
        let tree = tree_of(&SEVEN);
        assert_eq!(ids(&tree, order), expected);
        // restartable
        assert_eq!(ids(&tree, order), expected);
    }

    #[test]
    fn ascending_inserts_degenerate_into_a_chain() {
        let tree = tree_of(&["1", "2", "3", "4"]);

        assert_eq!(tree.height(), 4);
        let mut node = tree.root.as_deref();
        while let Some(n) = node {
            assert!(n.left.is_none());
            node = n.right.as_deref();
        }
        assert_eq!(ids(&tree, TraversalOrder::InOrder), ["1", "2", "3", "4"]);
        assert_eq!(tree.search("3"), Some(&bid("3")));
    }

    #[test]
    fn duplicate_ids_go_right() {
        let mut tree = tree_of(&["5"]);
        tree.insert(Bid::new("5", "Second", "Other Fund", Decimal::ONE));

        let root = tree.root.as_deref().unwrap();
        assert!(root.left.is_none());
        assert_eq!(root.right.as_ref().unwrap().bid.title(), "Second");
        assert_eq!(tree.len(), 2);
        assert_eq!(ids(&tree, TraversalOrder::InOrder), ["5", "5"]);
    }

    #[test]
    fn removing_a_duplicate_takes_the_one_nearest_the_root() {
        let mut tree = tree_of(&["5"]);
        tree.insert(Bid::new("5", "Second", "Other Fund", Decimal::ONE));

        let removed = tree.remove("5").unwrap();
        assert_eq!(removed.title(), "Item 5");
        assert_eq!(tree.search("5").unwrap().title(), "Second");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn remove_leaf() {
        let mut tree = tree_of(&SEVEN);
        assert_eq!(tree.remove("1"), Some(bid("1")));

        assert_eq!(tree.search("1"), None);
        assert_eq!(ids(&tree, TraversalOrder::PreOrder), ["5", "3", "4", "8", "7", "9"]);
        assert_eq!(tree.len(), 6);
    }

    #[test_case(&["5", "3", "1"], "3", &["5", "1"] ; "only left child")]
    #[test_case(&["5", "3", "4"], "3", &["5", "4"] ; "only right child")]
    #[test_case(&["1", "2", "3"], "1", &["2", "3"] ; "root with only right child")]
    fn remove_with_one_child_promotes_it(inserted: &[&str], target: &str, pre_order: &[&str]) {
        let mut tree = tree_of(inserted);
        assert_eq!(tree.remove(target), Some(bid(target)));
        assert_eq!(ids(&tree, TraversalOrder::PreOrder), pre_order);
    }

    #[test]
    fn remove_with_two_children_promotes_the_successor() {
        let mut tree = tree_of(&SEVEN);
        let root_before: *const Node = tree.root.as_deref().unwrap();

        assert_eq!(tree.remove("5"), Some(bid("5")));

        let root_after: *const Node = tree.root.as_deref().unwrap();
        assert_eq!(root_before, root_after, "the matched node stays linked");
        assert_eq!(root_id(&tree), Some("7"));
        assert_eq!(
            ids(&tree, TraversalOrder::InOrder),
            ["1", "3", "4", "7", "8", "9"]
        );
        assert_eq!(ids(&tree, TraversalOrder::PreOrder), ["7", "3", "1", "4", "8", "9"]);
        assert_eq!(tree.search("5"), None);
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn remove_with_two_children_splices_the_successors_right_subtree() {
        // successor 6 has a right child 7 that must take its place
        let mut tree = tree_of(&["5", "3", "9", "6", "7", "10"]);
        tree.remove("5");

        assert_eq!(root_id(&tree), Some("6"));
        assert_eq!(ids(&tree, TraversalOrder::InOrder), ["10", "3", "6", "7", "9"]);
        assert_eq!(tree.search("7"), Some(&bid("7")));
    }

    #[test]
    fn remove_missing_id_is_a_no_op() {
        let mut tree = tree_of(&SEVEN);
        let before = ids(&tree, TraversalOrder::InOrder);

        assert_eq!(tree.remove("6"), None);
        assert_eq!(ids(&tree, TraversalOrder::InOrder), before);
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn remove_from_empty_tree_is_a_no_op() {
        let mut tree = BinarySearchTree::new();
        assert_eq!(tree.remove("98223"), None);
        assert!(tree.is_empty());
    }

    #[test]
    fn remove_everything_empties_the_tree() {
        let mut tree = tree_of(&SEVEN);
        for id in SEVEN {
            assert!(tree.remove(id).is_some());
        }
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn len_tracks_inserts_minus_removes() {
        let all = scrambled_ids(500);
        let mut tree: BinarySearchTree = all.iter().map(|id| bid(id)).collect();

        for id in all.iter().step_by(3) {
            assert!(tree.remove(id).is_some());
            assert_eq!(tree.search(id), None);
        }

        let removed = all.iter().step_by(3).count();
        assert_eq!(tree.len(), 500 - removed);
        assert_eq!(tree.iter().count(), tree.len());
    }

    #[test]
    fn in_order_is_sorted_after_mixed_operations() {
        let all = scrambled_ids(300);
        let mut tree: BinarySearchTree = all.iter().map(|id| bid(id)).collect();
        for id in all.iter().skip(1).step_by(4) {
            tree.remove(id);
        }
        tree.extend(all.iter().take(20).map(|id| bid(id)));

        let sorted = ids(&tree, TraversalOrder::InOrder);
        assert!(sorted.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(sorted.len(), tree.len());
    }

    #[test]
    fn every_order_visits_every_bid_once() {
        let tree: BinarySearchTree = scrambled_ids(200).iter().map(|id| bid(id)).collect();
        let expected = ids(&tree, TraversalOrder::InOrder);

        for order in [TraversalOrder::PreOrder, TraversalOrder::PostOrder] {
            let mut visited = ids(&tree, order);
            visited.sort();
            assert_eq!(visited, expected);
        }
    }

    #[test]
    fn deep_chain_is_walked_and_dropped_without_recursion() {
        let n = 100_000;
        let key = |i: usize| format!("{i:06}");

        // inserting one by one is quadratic on a chain, so link it directly
        let mut chain: Link = None;
        for i in (0..n).rev() {
            let mut node = Node::new(bid(&key(i)));
            node.right = chain;
            chain = Some(node);
        }
        let mut tree = BinarySearchTree { root: chain, len: n };

        assert_eq!(tree.height(), n);
        assert!(tree.search(&key(n - 1)).is_some());
        assert_eq!(tree.traverse(TraversalOrder::PostOrder).count(), n);
        assert!(tree.remove(&key(n - 2)).is_some());
        assert_eq!(tree.len(), n - 1);
        drop(tree);
    }

    #[test]
    fn clear_releases_everything_and_the_tree_stays_usable() {
        let mut tree = tree_of(&SEVEN);
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);

        tree.clear();
        tree.insert(bid("1"));
        assert_eq!(ids(&tree, TraversalOrder::InOrder), ["1"]);
    }

    #[test]
    fn debug_lists_bids_in_order() {
        let tree = tree_of(&["2", "1"]);
        let debug = format!("{tree:?}");
        assert!(debug.find("\"1\"").unwrap() < debug.find("\"2\"").unwrap());
    }
}
