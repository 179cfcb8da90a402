//! Blog posts: a categorised collection of titled entries.

use crate::collection::{Collection, Entity, ItemId};
use crate::validation::{non_blank, require_title, ValidationError};
use cartwheel_core::effect::Effect;
use cartwheel_core::environment::{Clock, IdGenerator};
use cartwheel_core::reducer::Reducer;
use cartwheel_core::{smallvec, SmallVec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category given to posts created without one
pub const DEFAULT_CATEGORY: &str = "general";

/// A published post
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post id
    pub id: ItemId,
    /// Non-empty title
    pub title: String,
    /// Body text
    pub content: String,
    /// Category label
    pub category: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Entity for Post {
    fn id(&self) -> ItemId {
        self.id
    }
}

/// A post before it has an id
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    /// Title (validated non-empty by [`BlogAction::add`])
    pub title: String,
    /// Body text
    pub content: String,
    /// Category, or `None` for the reducer's default
    pub category: Option<String>,
}

impl NewPost {
    /// Creates a post draft without a category
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category: None,
        }
    }

    /// Sets the category
    #[must_use]
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Fields of a [`Post`] that may be edited
///
/// `None` leaves the field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPatch {
    /// New title
    pub title: Option<String>,
    /// New content
    pub content: Option<String>,
    /// New category
    pub category: Option<String>,
}

impl PostPatch {
    fn apply_to(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(category) = self.category {
            post.category = category;
        }
    }
}

/// State of the blog feature
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogState {
    /// Posts in creation order
    pub posts: Collection<Post>,
}

impl BlogState {
    /// Creates an empty blog
    #[must_use]
    pub const fn new() -> Self {
        Self {
            posts: Collection::new(),
        }
    }

    /// A blog seeded with one demo post
    ///
    /// The post id is drawn from `ids`, so later posts never collide with it.
    pub fn with_welcome_post(ids: &impl IdGenerator, clock: &impl Clock) -> Self {
        let mut state = Self::new();
        state.posts.push(Post {
            id: ItemId::new(ids.next_id()),
            title: "Welcome".to_string(),
            content: "This blog keeps its posts in a reducer-managed collection.".to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            created_at: clock.now(),
        });
        state
    }

    /// Posts whose category equals `category`
    pub fn posts_in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Post> + 'a {
        self.posts.iter().filter(move |post| post.category == category)
    }

    /// Distinct categories, in order of first appearance
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for post in &self.posts {
            if !seen.contains(&post.category.as_str()) {
                seen.push(&post.category);
            }
        }
        seen
    }
}

/// Actions for the blog feature
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum BlogAction {
    /// Append a post
    Add {
        /// Id for the new post
        id: ItemId,
        /// Post contents
        post: NewPost,
        /// Creation time
        at: DateTime<Utc>,
    },
    /// Edit a post in place
    Update {
        /// Target post
        id: ItemId,
        /// Fields to change
        patch: PostPatch,
    },
    /// Delete a post
    Remove {
        /// Target post
        id: ItemId,
    },
    /// Delete every post
    Clear,
    /// Replace every post
    Replace {
        /// New contents, taken as-is
        posts: Vec<Post>,
    },
}

impl BlogAction {
    /// Validates a draft and builds the `Add` action for it
    ///
    /// The title is trimmed, and a blank category becomes `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] for a blank title.
    pub fn add(
        post: NewPost,
        ids: &impl IdGenerator,
        clock: &impl Clock,
    ) -> Result<Self, ValidationError> {
        let title = require_title(&post.title)?;
        let category = post.category.as_deref().and_then(non_blank);

        Ok(Self::Add {
            id: ItemId::new(ids.next_id()),
            post: NewPost {
                title,
                content: post.content,
                category,
            },
            at: clock.now(),
        })
    }

    /// Validates a patch and builds the `Update` action for it
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] if the patch blanks the title.
    /// A blank category leaves the post's category unchanged.
    pub fn update(id: ItemId, mut patch: PostPatch) -> Result<Self, ValidationError> {
        if let Some(title) = patch.title.as_deref() {
            patch.title = Some(require_title(title)?);
        }
        patch.category = patch.category.as_deref().and_then(non_blank);
        Ok(Self::Update { id, patch })
    }
}

/// Reducer for the blog feature
#[derive(Clone, Debug)]
pub struct BlogReducer {
    default_category: String,
}

impl BlogReducer {
    /// Creates a reducer filling in [`DEFAULT_CATEGORY`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_default_category(DEFAULT_CATEGORY)
    }

    /// Creates a reducer filling in `category` for uncategorised posts
    #[must_use]
    pub fn with_default_category(category: impl Into<String>) -> Self {
        Self {
            default_category: category.into(),
        }
    }
}

impl Default for BlogReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for BlogReducer {
    type State = BlogState;
    type Action = BlogAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            BlogAction::Add { id, post, at } => {
                let post = Post {
                    id,
                    title: post.title,
                    content: post.content,
                    category: post
                        .category
                        .unwrap_or_else(|| self.default_category.clone()),
                    created_at: at,
                };
                if !state.posts.push(post) {
                    tracing::warn!(%id, "Ignoring post with duplicate id");
                }
            },
            BlogAction::Update { id, patch } => {
                if !state.posts.update(id, |post| patch.apply_to(post)) {
                    tracing::trace!(%id, "Update for unknown post");
                }
            },
            BlogAction::Remove { id } => {
                if state.posts.remove(id).is_none() {
                    tracing::trace!(%id, "Remove for unknown post");
                }
            },
            BlogAction::Clear => state.posts.clear(),
            BlogAction::Replace { posts } => state.posts.replace(posts),
        }

        smallvec![Effect::None]
    }
}
