use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct MessageDoc { pub message: String }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct TodoItemDoc {
    pub owner_id: String,
    pub item_id: String,
    pub name: String,
    pub due_date: String,
    /// RFC 3339, UTC
    pub created_at: String,
    pub done: bool,
    pub attachment_url: Option<String>,
}

#[derive(ToSchema)]
pub struct TodoListDoc { pub items: Vec<TodoItemDoc> }

#[derive(ToSchema)]
pub struct CreatedTodoDoc { pub item: TodoItemDoc }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct CreateTodoDoc { pub name: String, pub due_date: String }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct UpdateTodoDoc { pub name: String, pub due_date: String, pub done: bool }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct UploadUrlDoc { pub upload_url: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::todos::list,
        crate::routes::todos::create,
        crate::routes::todos::update,
        crate::routes::todos::delete,
        crate::routes::todos::upload_url,
    ),
    components(
        schemas(
            HealthResponse,
            MessageDoc,
            TodoItemDoc,
            TodoListDoc,
            CreatedTodoDoc,
            CreateTodoDoc,
            UpdateTodoDoc,
            UploadUrlDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "todos")
    )
)]
pub struct ApiDoc;
