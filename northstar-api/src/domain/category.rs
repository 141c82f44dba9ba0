use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<i32>,
    pub featured: bool,
    pub display_order: i32,
}

/// Category membership of a business, as embedded in business projections.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub is_primary: bool,
}

/// A category with its business count and (directly nested) children.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub business_count: i64,
    pub children: Vec<CategoryNode>,
}

/// Build the full category hierarchy from a flat `(category, business count)`
/// listing. Children are ordered by display order at every level; orphaned
/// parent references fall back to the root.
pub fn build_category_tree(categories: Vec<(Category, i64)>) -> Vec<CategoryNode> {
    let known: Vec<i32> = categories.iter().map(|(c, _)| c.id).collect();
    let mut by_parent: HashMap<Option<i32>, Vec<(Category, i64)>> = HashMap::new();
    for (category, count) in categories {
        let parent = category
            .parent_id
            .filter(|parent_id| known.contains(parent_id));
        by_parent.entry(parent).or_default().push((category, count));
    }

    collect_children(None, &mut by_parent)
}

fn collect_children(
    parent: Option<i32>,
    by_parent: &mut HashMap<Option<i32>, Vec<(Category, i64)>>,
) -> Vec<CategoryNode> {
    let mut entries = by_parent.remove(&parent).unwrap_or_default();
    entries.sort_by_key(|(c, _)| (c.display_order, c.id));

    entries
        .into_iter()
        .map(|(category, business_count)| {
            let children = collect_children(Some(category.id), by_parent);
            CategoryNode {
                category,
                business_count,
                children,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<i32>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<i32>,
    pub featured: Option<bool>,
    pub display_order: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: i32, parent_id: Option<i32>, display_order: i32) -> Category {
        Category {
            id,
            slug: format!("cat-{id}"),
            name: format!("Category {id}"),
            description: None,
            icon: None,
            image: None,
            parent_id,
            featured: false,
            display_order,
        }
    }

    #[test]
    fn builds_nested_tree_in_display_order() {
        let flat = vec![
            (category(1, None, 2), 5),
            (category(2, None, 1), 3),
            (category(3, Some(1), 0), 1),
            (category(4, Some(1), 1), 0),
        ];

        let tree = build_category_tree(flat);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].category.id, 2);
        assert_eq!(tree[1].category.id, 1);
        let children: Vec<i32> = tree[1].children.iter().map(|n| n.category.id).collect();
        assert_eq!(children, vec![3, 4]);
    }

    #[test]
    fn orphaned_parent_lands_at_root() {
        let flat = vec![(category(7, Some(99), 0), 0)];
        let tree = build_category_tree(flat);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].category.id, 7);
    }
}
