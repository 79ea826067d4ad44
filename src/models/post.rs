use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{error::AppError, models::user::{UserSummary, validate_url_string}};

/// Discriminant stored in the `posts.kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Social,
    Product,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Social => "social",
            PostKind::Product => "product",
        }
    }
}

/// Purchasable listing carried by a product-kind post.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub titulo: String,
    pub descricao: Option<String>,
    pub preco: f64,
    pub file_path: String,
    pub categoria: Option<String>,
}

/// Payload of a post. Social updates and product listings share the feed
/// but never share fields.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "tipo", rename_all = "lowercase")]
pub enum PostBody {
    Social {
        conteudo: Option<String>,
        imagem: Option<String>,
    },
    Product(Listing),
}

/// Raw row of the 'posts' table. Nullable product columns are folded into
/// `PostBody` by `Post::try_from`.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub author_id: i64,
    pub kind: String,
    pub content: Option<String>,
    pub image: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub file_path: Option<String>,
    pub category: Option<String>,
    pub downloads: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Columns selected whenever a `PostRow` is loaded (table alias `p`).
pub const POST_COLUMNS: &str = "p.id, p.author_id, p.kind, p.content, p.image, p.title, \
     p.description, p.price, p.file_path, p.category, p.downloads, p.created_at";

/// A post with its payload resolved to the right variant.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    #[serde(flatten)]
    pub body: PostBody,
    pub downloads: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = AppError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let body = match row.kind.as_str() {
            "social" => PostBody::Social {
                conteudo: row.content,
                imagem: row.image,
            },
            "product" => {
                let (Some(titulo), Some(preco), Some(file_path)) =
                    (row.title, row.price, row.file_path)
                else {
                    return Err(AppError::InternalServerError(format!(
                        "product post {} is missing listing fields",
                        row.id
                    )));
                };
                PostBody::Product(Listing {
                    titulo,
                    descricao: row.description,
                    preco,
                    file_path,
                    categoria: row.category,
                })
            }
            other => {
                return Err(AppError::InternalServerError(format!(
                    "post {} has unknown kind '{}'",
                    row.id, other
                )));
            }
        };

        Ok(Post {
            id: row.id,
            author_id: row.author_id,
            body,
            downloads: row.downloads,
            created_at: row.created_at,
        })
    }
}

/// Feed row: a post joined with its author and derived counters.
#[derive(Debug, FromRow)]
pub struct FeedRow {
    #[sqlx(flatten)]
    pub post: PostRow,
    pub author_username: String,
    pub author_nome: String,
    pub author_avatar: Option<String>,
    pub likes: i64,
    pub comments: i64,
}

/// DTO for displaying a post in the feed.
#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: UserSummary,
    pub likes: i64,
    pub comments: i64,
}

impl TryFrom<FeedRow> for PostView {
    type Error = AppError;

    fn try_from(row: FeedRow) -> Result<Self, Self::Error> {
        let author = UserSummary {
            id: row.post.author_id,
            username: row.author_username,
            nome: row.author_nome,
            avatar: row.author_avatar,
        };
        Ok(PostView {
            post: Post::try_from(row.post)?,
            author,
            likes: row.likes,
            comments: row.comments,
        })
    }
}

/// DTO for creating a social update.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSocialPost {
    #[validate(length(
        min = 1,
        max = 10000,
        message = "Content length must be between 1 and 10000 chars"
    ))]
    pub conteudo: String,
    #[validate(length(max = 250), custom(function = validate_url_string))]
    pub imagem: Option<String>,
}

/// DTO for creating a product listing.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateListing {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 chars"
    ))]
    pub titulo: String,
    #[validate(length(max = 10000))]
    pub descricao: Option<String>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub preco: f64,
    #[validate(length(min = 1, max = 300))]
    pub file_path: String,
    #[validate(length(max = 80))]
    pub categoria: Option<String>,
}

/// Body of `POST /api/posts`, discriminated by `tipo`.
#[derive(Debug, Deserialize)]
#[serde(tag = "tipo", rename_all = "lowercase")]
pub enum CreatePostRequest {
    Social(CreateSocialPost),
    Product(CreateListing),
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<(), validator::ValidationErrors> {
        match self {
            CreatePostRequest::Social(social) => social.validate(),
            CreatePostRequest::Product(listing) => listing.validate(),
        }
    }
}

/// Query parameters for listing posts.
#[derive(Debug, Deserialize)]
pub struct PostListParams {
    /// Cursor for pagination: the created_at timestamp of the last post in the previous page.
    pub cursor: Option<chrono::DateTime<chrono::Utc>>,

    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,
}
