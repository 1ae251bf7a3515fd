//! # Catalogue
//!
//! Posts and reactions shipped with the client. Ids are derived from slugs,
//! so the same slug always addresses the same on-ledger counter.

use super::entities::ReactionKey;
use super::value_objects::ContentId;

/// A post readers can react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Post {
    /// Stable slug, hashed into the post id.
    pub slug: &'static str,
    /// Display title.
    pub title: &'static str,
    /// Body text.
    pub body: &'static str,
}

impl Post {
    /// Content-addressed post id.
    pub fn id(&self) -> ContentId {
        ContentId::from_slug(self.slug)
    }

    /// Counter key for `reaction` on this post.
    pub fn key(&self, reaction: &Reaction) -> ReactionKey {
        ReactionKey::new(self.id(), reaction.id())
    }
}

/// A reaction kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reaction {
    /// Stable key, hashed into the reaction id.
    pub key: &'static str,
    /// Display emoji.
    pub emoji: &'static str,
}

impl Reaction {
    /// Content-addressed reaction id.
    pub fn id(&self) -> ContentId {
        ContentId::from_slug(self.key)
    }
}

/// Built-in reactions.
pub const REACTIONS: [Reaction; 4] = [
    Reaction { key: "clap", emoji: "👏" },
    Reaction { key: "heart", emoji: "❤️" },
    Reaction { key: "fire", emoji: "🔥" },
    Reaction { key: "lol", emoji: "😂" },
];

/// Built-in posts.
pub const POSTS: [Post; 3] = [
    Post {
        slug: "hello-world",
        title: "Hello World",
        body: "My first private post.",
    },
    Post {
        slug: "cats-onchain",
        title: "Cats Onchain",
        body: "Do cats like FHE?",
    },
    Post {
        slug: "gm-privacy",
        title: "GM Privacy",
        body: "Why private reactions matter.",
    },
];

/// Look up a reaction by key.
pub fn reaction(key: &str) -> Option<&'static Reaction> {
    REACTIONS.iter().find(|r| r.key == key)
}
