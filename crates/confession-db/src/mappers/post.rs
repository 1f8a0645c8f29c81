//! Post entity <-> model mapper

use confession_core::entities::Post;
use confession_core::value_objects::PostId;

use crate::models::PostModel;

impl From<PostModel> for Post {
    fn from(model: PostModel) -> Self {
        Post {
            id: PostId::new(model.id),
            content: model.content,
            created_at: model.created_at,
            likes: model.likes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_model_to_entity() {
        let id = Uuid::new_v4();
        let model = PostModel {
            id,
            content: "I never read the terms".to_string(),
            created_at: Utc::now(),
            likes: 7,
        };

        let post = Post::from(model);
        assert_eq!(post.id.into_inner(), id);
        assert_eq!(post.likes, 7);
    }
}
