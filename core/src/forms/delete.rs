use tracing::info;

use super::modal::ActionTarget;
use super::{FieldErrors, FormSpec};
use crate::app::AppContext;
use crate::cache::{ITEMS, USERS};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::storage::Storage;
use crate::types::Message;

/// Confirmation dialog that deletes one user or item by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteForm {
    pub target: ActionTarget,
}

impl DeleteForm {
    pub fn new(target: ActionTarget) -> Self {
        Self { target }
    }
}

impl FormSpec for DeleteForm {
    type Output = Message;
    const FIELDS: &'static [&'static str] = &[];

    fn validate(&self) -> FieldErrors {
        FieldErrors::new()
    }

    fn build(&self, client: &ApiClient) -> Result<HttpRequest, ApiError> {
        Ok(match &self.target {
            ActionTarget::User(user) => client.build_delete_user(user.id),
            ActionTarget::Item(item) => client.build_delete_item(item.id),
        })
    }

    fn parse(&self, client: &ApiClient, response: HttpResponse) -> Result<Message, ApiError> {
        match &self.target {
            ActionTarget::User(_) => client.parse_delete_user(response),
            ActionTarget::Item(_) => client.parse_delete_item(response),
        }
    }

    fn invalidates(&self) -> &'static [&'static str] {
        match self.target {
            // the server deletes the user's items along with the user
            ActionTarget::User(_) => &[USERS, ITEMS],
            ActionTarget::Item(_) => &[ITEMS],
        }
    }

    fn success_message(&self) -> Option<String> {
        Some(format!("The {} was deleted successfully.", self.target.kind()))
    }

    fn on_success<S: Storage>(&self, ctx: &mut AppContext<S>, _output: &Message) {
        if let ActionTarget::User(user) = &self.target {
            if ctx.session.user().is_some_and(|me| me.id == user.id) {
                info!("deleted the signed-in user");
                ctx.logout();
            }
        }
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryKey;
    use crate::forms::testing::{ctx, Recorder};
    use crate::forms::Form;
    use crate::http::HttpMethod;
    use crate::routes::Route;
    use crate::types::{ItemPublic, UserPublic};
    use uuid::Uuid;

    fn user(id: u128) -> UserPublic {
        UserPublic {
            id: Uuid::from_u128(id),
            email: format!("u{id}@example.com"),
            full_name: None,
            is_active: true,
            is_superuser: false,
        }
    }

    #[test]
    fn delete_item_by_id() {
        let mut ctx = ctx();
        ctx.cache.set(QueryKey::page(ITEMS, 1), &0).unwrap();
        let transport = Recorder::replying(200, r#"{"message":"Item deleted successfully"}"#);
        let item = ItemPublic {
            id: Uuid::from_u128(9),
            title: "x".to_string(),
            description: None,
            owner_id: Uuid::nil(),
        };
        let mut form = Form::new(DeleteForm::new(ActionTarget::Item(item)));
        form.submit(&mut ctx, &transport).unwrap();

        let requests = transport.requests.borrow();
        assert_eq!(requests[0].method, HttpMethod::Delete);
        assert!(requests[0].path.ends_with("/api/v1/items/00000000-0000-0000-0000-000000000009"));
        assert!(!ctx.cache.is_fresh(&QueryKey::page(ITEMS, 1)));
        assert_eq!(ctx.toasts.drain()[0].message, "The item was deleted successfully.");
    }

    #[test]
    fn deleting_self_logs_out() {
        let mut ctx = ctx();
        let me = user(1);
        ctx.apply_current_user(Ok(me.clone()));
        let transport = Recorder::replying(200, r#"{"message":"User deleted successfully"}"#);
        let mut form = Form::new(DeleteForm::new(ActionTarget::User(me)));
        form.submit(&mut ctx, &transport).unwrap();

        assert!(!ctx.is_logged_in());
        assert_eq!(ctx.navigator.route(), Some(&Route::Login));
    }

    #[test]
    fn deleting_someone_else_keeps_session() {
        let mut ctx = ctx();
        ctx.apply_current_user(Ok(user(1)));
        let transport = Recorder::replying(200, r#"{"message":"User deleted successfully"}"#);
        let mut form = Form::new(DeleteForm::new(ActionTarget::User(user(2))));
        form.submit(&mut ctx, &transport).unwrap();
        assert!(ctx.is_logged_in());
    }
}
