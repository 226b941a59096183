//! The closed set of modal dialogs and the per-row actions menu that opens
//! them.

use uuid::Uuid;

use super::{
    AddItemForm, AddUserForm, DeleteAccountForm, DeleteForm, EditItemForm, EditUserForm, Form,
    SubmitError,
};
use crate::app::AppContext;
use crate::client::ApiClient;
use crate::http::{HttpRequest, HttpResponse};
use crate::storage::Storage;
use crate::transport::{Transport, TransportError};
use crate::types::{ItemPublic, UserPublic};

/// The record a row action applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTarget {
    User(UserPublic),
    Item(ItemPublic),
}

impl ActionTarget {
    pub fn id(&self) -> Uuid {
        match self {
            ActionTarget::User(u) => u.id,
            ActionTarget::Item(i) => i.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ActionTarget::User(_) => "user",
            ActionTarget::Item(_) => "item",
        }
    }
}

#[derive(Debug)]
pub enum Modal {
    AddUser(Form<AddUserForm>),
    EditUser(Form<EditUserForm>),
    AddItem(Form<AddItemForm>),
    EditItem(Form<EditItemForm>),
    Delete(Form<DeleteForm>),
    DeleteAccount(Form<DeleteAccountForm>),
}

macro_rules! each_form {
    ($modal:expr, $form:ident => $body:expr) => {
        match $modal {
            Modal::AddUser($form) => $body,
            Modal::EditUser($form) => $body,
            Modal::AddItem($form) => $body,
            Modal::EditItem($form) => $body,
            Modal::Delete($form) => $body,
            Modal::DeleteAccount($form) => $body,
        }
    };
}

impl Modal {
    pub fn add_user() -> Self {
        Modal::AddUser(Form::new(AddUserForm::default()))
    }

    pub fn add_item() -> Self {
        Modal::AddItem(Form::new(AddItemForm::default()))
    }

    pub fn edit(target: &ActionTarget) -> Self {
        match target {
            ActionTarget::User(user) => Modal::EditUser(Form::new(EditUserForm::new(user))),
            ActionTarget::Item(item) => Modal::EditItem(Form::new(EditItemForm::new(item))),
        }
    }

    pub fn delete(target: ActionTarget) -> Self {
        Modal::Delete(Form::new(DeleteForm::new(target)))
    }

    pub fn delete_account() -> Self {
        Modal::DeleteAccount(Form::new(DeleteAccountForm))
    }

    pub fn title(&self) -> &'static str {
        match self {
            Modal::AddUser(_) => "Add User",
            Modal::EditUser(_) => "Edit User",
            Modal::AddItem(_) => "Add Item",
            Modal::EditItem(_) => "Edit Item",
            Modal::Delete(form) => match form.values().target {
                ActionTarget::User(_) => "Delete User",
                ActionTarget::Item(_) => "Delete Item",
            },
            Modal::DeleteAccount(_) => "Confirmation Required",
        }
    }

    pub fn is_open(&self) -> bool {
        each_form!(self, form => form.is_open())
    }

    pub fn is_pending(&self) -> bool {
        each_form!(self, form => form.is_pending())
    }

    pub fn close(&mut self) {
        each_form!(self, form => form.close())
    }

    pub fn begin_submit(&mut self, client: &ApiClient) -> Result<HttpRequest, SubmitError> {
        each_form!(self, form => form.begin_submit(client))
    }

    pub fn finish_submit<S: Storage>(
        &mut self,
        ctx: &mut AppContext<S>,
        response: Result<HttpResponse, TransportError>,
    ) -> Result<(), SubmitError> {
        each_form!(self, form => form.finish_submit(ctx, response).map(drop))
    }

    pub fn submit<S: Storage>(
        &mut self,
        ctx: &mut AppContext<S>,
        transport: &dyn Transport,
    ) -> Result<(), SubmitError> {
        each_form!(self, form => form.submit(ctx, transport).map(drop))
    }
}

/// Edit/delete menu on a table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionsMenu {
    pub target: ActionTarget,
    pub disabled: bool,
}

impl ActionsMenu {
    /// Menu for a users-table row; disabled on the signed-in user's own row.
    pub fn for_user(user: &UserPublic, current: Option<&UserPublic>) -> Self {
        Self {
            disabled: current.is_some_and(|me| me.id == user.id),
            target: ActionTarget::User(user.clone()),
        }
    }

    pub fn for_item(item: &ItemPublic) -> Self {
        Self {
            target: ActionTarget::Item(item.clone()),
            disabled: false,
        }
    }

    pub fn edit(&self) -> Option<Modal> {
        (!self.disabled).then(|| Modal::edit(&self.target))
    }

    pub fn delete(&self) -> Option<Modal> {
        (!self.disabled).then(|| Modal::delete(self.target.clone()))
    }
}
