//! Paginated, cached list views over a resource collection.
//!
//! # Design
//! A table knows its page and page size; the rows themselves live in the
//! `QueryCache` under `(resource, page)`. After `set_page` the rows of the
//! previous page stay on screen, flagged as placeholder, until the new page
//! arrives. A full page triggers a prefetch of the next one so paging
//! forward is instant.
//!
//! Hosts with a blocking transport call `load`; hosts that drive I/O
//! themselves use `begin_load`/`finish_load` and `prefetch_request`.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey, ITEMS, USERS};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::pagination::{total_pages, with_page_in_query, NextPagePolicy, PageRequest};
use crate::transport::Transport;
use crate::types::{ItemPublic, Page, UserPublic};

/// A collection endpoint a table can page through.
pub trait ListResource {
    const NAME: &'static str;
    type Row: Clone + Serialize + DeserializeOwned;

    fn build_list(client: &ApiClient, skip: u64, limit: u64) -> HttpRequest;
    fn parse_list(client: &ApiClient, response: HttpResponse) -> Result<Page<Self::Row>, ApiError>;
}

pub struct UsersResource;

impl ListResource for UsersResource {
    const NAME: &'static str = USERS;
    type Row = UserPublic;

    fn build_list(client: &ApiClient, skip: u64, limit: u64) -> HttpRequest {
        client.build_read_users(skip, limit)
    }

    fn parse_list(
        client: &ApiClient,
        response: HttpResponse,
    ) -> Result<Page<UserPublic>, ApiError> {
        client.parse_read_users(response)
    }
}

pub struct ItemsResource;

impl ListResource for ItemsResource {
    const NAME: &'static str = ITEMS;
    type Row = ItemPublic;

    fn build_list(client: &ApiClient, skip: u64, limit: u64) -> HttpRequest {
        client.build_read_items(skip, limit)
    }

    fn parse_list(
        client: &ApiClient,
        response: HttpResponse,
    ) -> Result<Page<ItemPublic>, ApiError> {
        client.parse_read_items(response)
    }
}

pub type UsersTable = PaginatedTable<UsersResource>;
pub type ItemsTable = PaginatedTable<ItemsResource>;

pub struct PaginatedTable<R: ListResource> {
    request: PageRequest,
    policy: NextPagePolicy,
    displayed: Option<Page<R::Row>>,
    displayed_page: Option<u32>,
    _resource: PhantomData<R>,
}

impl<R: ListResource> PaginatedTable<R> {
    pub fn new(page: u32, size: u32, policy: NextPagePolicy) -> Self {
        Self {
            request: PageRequest::new(page, size),
            policy,
            displayed: None,
            displayed_page: None,
            _resource: PhantomData,
        }
    }

    pub fn page(&self) -> u32 {
        self.request.page
    }

    pub fn page_request(&self) -> PageRequest {
        self.request
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::page(R::NAME, self.request.page)
    }

    /// Rows on screen: the current page, or the previous one while the
    /// current page is loading.
    pub fn rows(&self) -> &[R::Row] {
        self.displayed.as_ref().map(|p| p.data.as_slice()).unwrap_or(&[])
    }

    pub fn count(&self) -> u64 {
        self.displayed.as_ref().map_or(0, |p| p.count)
    }

    /// Nothing has ever been displayed; the host shows a skeleton row.
    pub fn is_pending(&self) -> bool {
        self.displayed.is_none()
    }

    /// The rows on screen belong to another page.
    pub fn is_placeholder(&self) -> bool {
        self.displayed.is_some() && self.displayed_page != Some(self.request.page)
    }

    pub fn has_previous(&self) -> bool {
        self.request.has_previous()
    }

    pub fn has_next(&self) -> bool {
        !self.is_placeholder()
            && self
                .displayed
                .as_ref()
                .is_some_and(|p| self.request.has_next(p.data.len(), p.count, self.policy))
    }

    pub fn total_pages(&self) -> u64 {
        total_pages(self.count(), self.request.size)
    }

    /// "Page X of Y".
    pub fn label(&self) -> String {
        format!("Page {} of {}", self.request.page, self.total_pages())
    }

    /// URL search string for the current page, keeping other parameters.
    pub fn query_string(&self, current_query: &str) -> String {
        with_page_in_query(current_query, self.request.page)
    }

    /// Switch pages. Rows of the old page stay displayed as placeholder.
    pub fn set_page(&mut self, page: u32) {
        self.request = PageRequest::new(page, self.request.size);
    }

    pub fn next_page(&mut self) -> bool {
        let Some(next) = self.request.page.checked_add(1).filter(|_| self.has_next()) else {
            return false;
        };
        self.set_page(next);
        true
    }

    pub fn previous_page(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.set_page(self.request.page - 1);
        true
    }

    /// Show whatever the cache holds for the current page, fresh or stale.
    /// Returns whether the page is fresh (no fetch needed).
    pub fn sync_from_cache(&mut self, cache: &QueryCache) -> bool {
        let key = self.key();
        if let Some(page) = cache.get::<Page<R::Row>>(&key) {
            self.show(page);
        }
        cache.is_fresh(&key)
    }

    /// Claim the current page for fetching. `None` when the cache already
    /// has it fresh or a fetch is outstanding.
    pub fn begin_load(
        &mut self,
        client: &ApiClient,
        cache: &mut QueryCache,
    ) -> Option<HttpRequest> {
        if self.sync_from_cache(cache) {
            return None;
        }
        if !cache.begin_fetch(&self.key()) {
            return None;
        }
        Some(R::build_list(client, self.request.skip(), self.request.limit()))
    }

    /// Store the answer to `begin_load`'s request for `page` and display it
    /// if that page is still the current one.
    pub fn finish_load(
        &mut self,
        client: &ApiClient,
        cache: &mut QueryCache,
        page: u32,
        response: HttpResponse,
    ) -> Result<(), ApiError> {
        let key = QueryKey::page(R::NAME, page);
        match R::parse_list(client, response) {
            Ok(data) => {
                cache.complete_fetch(&key, &data)?;
                if page == self.request.page {
                    self.show(data);
                }
                Ok(())
            }
            Err(e) => {
                cache.fail_fetch(&key);
                Err(e)
            }
        }
    }

    /// Request for the page after the current one, when the current page
    /// is full and the next page is neither cached fresh nor in flight.
    pub fn prefetch_request(
        &self,
        client: &ApiClient,
        cache: &mut QueryCache,
    ) -> Option<(u32, HttpRequest)> {
        let current = self.displayed.as_ref().filter(|_| !self.is_placeholder())?;
        if !self.request.should_prefetch_next(current.data.len()) {
            return None;
        }
        let next = self.request.next();
        if !cache.begin_fetch(&QueryKey::page(R::NAME, next.page)) {
            return None;
        }
        Some((next.page, R::build_list(client, next.skip(), next.limit())))
    }

    /// Fetch the current page through `transport` (or take it from the
    /// cache), then prefetch the next page if this one is full.
    pub fn load(
        &mut self,
        client: &ApiClient,
        cache: &mut QueryCache,
        transport: &dyn Transport,
    ) -> Result<(), ApiError> {
        let request = self.request;
        let key = self.key();
        let page: Page<R::Row> = cache.fetch_with(&key, || {
            client.call(
                transport,
                |c| Ok(R::build_list(c, request.skip(), request.limit())),
                R::parse_list,
            )
        })?;
        let full = request.should_prefetch_next(page.data.len());
        self.show(page);

        if full {
            let next = request.next();
            cache.prefetch_with(&QueryKey::page(R::NAME, next.page), || {
                client.call(
                    transport,
                    |c| Ok(R::build_list(c, next.skip(), next.limit())),
                    R::parse_list,
                )
            });
        }
        Ok(())
    }

    fn show(&mut self, page: Page<R::Row>) {
        debug!(
            resource = R::NAME,
            page = self.request.page,
            rows = page.data.len(),
            "displaying page"
        );
        self.displayed = Some(page);
        self.displayed_page = Some(self.request.page);
    }
}

/// A users-table row as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: &'static str,
    pub status: &'static str,
    /// Marks the signed-in user ("You").
    pub is_current: bool,
    /// Users cannot edit or delete themselves from the admin table.
    pub actions_enabled: bool,
}

pub fn user_rows(users: &[UserPublic], current: Option<&UserPublic>) -> Vec<UserRow> {
    users
        .iter()
        .map(|u| {
            let is_current = current.is_some_and(|c| c.id == u.id);
            UserRow {
                id: u.id,
                full_name: non_empty_or_na(u.full_name.as_deref()),
                email: u.email.clone(),
                role: if u.is_superuser { "Superuser" } else { "User" },
                status: if u.is_active { "Active" } else { "Inactive" },
                is_current,
                actions_enabled: !is_current,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
}

pub fn item_rows(items: &[ItemPublic]) -> Vec<ItemRow> {
    items
        .iter()
        .map(|i| ItemRow {
            id: i.id,
            title: i.title.clone(),
            description: non_empty_or_na(i.description.as_deref()),
        })
        .collect()
}

fn non_empty_or_na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::testing::{ctx, Recorder};
    use crate::forms::{AddItemForm, Form};
    use crate::transport::TransportError;
    use std::cell::RefCell;

    /// Serves `total` fake items and records every requested URL.
    struct FakeItems {
        total: u64,
        seen: RefCell<Vec<String>>,
    }

    impl FakeItems {
        fn new(total: u64) -> Self {
            Self {
                total,
                seen: RefCell::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.seen.borrow().clone()
        }
    }

    impl Transport for FakeItems {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.borrow_mut().push(request.path.clone());
            let query = request.path.split_once('?').map(|(_, q)| q).unwrap_or("");
            let param = |name: &str| -> u64 {
                query
                    .split('&')
                    .filter_map(|p| p.split_once('='))
                    .find(|(k, _)| *k == name)
                    .and_then(|(_, v)| v.parse().ok())
                    .unwrap_or(0)
            };
            let (skip, limit) = (param("skip"), param("limit"));
            let data: Vec<ItemPublic> = (skip..self.total.min(skip + limit))
                .map(|n| ItemPublic {
                    id: Uuid::from_u128(u128::from(n) + 1),
                    title: format!("item {n}"),
                    description: None,
                    owner_id: Uuid::nil(),
                })
                .collect();
            let body = serde_json::to_string(&Page { data, count: self.total }).unwrap();
            Ok(HttpResponse::new(200, body))
        }
    }

    fn client() -> ApiClient {
        ApiClient::new("http://api")
    }

    #[test]
    fn full_page_prefetches_next() {
        let transport = FakeItems::new(12);
        let mut cache = QueryCache::new();
        let mut table = ItemsTable::new(1, 5, NextPagePolicy::FullPage);

        table.load(&client(), &mut cache, &transport).unwrap();
        assert_eq!(table.rows().len(), 5);
        assert_eq!(
            transport.requests(),
            vec![
                "http://api/api/v1/items/?skip=0&limit=5",
                "http://api/api/v1/items/?skip=5&limit=5",
            ]
        );
        assert!(cache.is_fresh(&QueryKey::page(ITEMS, 2)));
    }

    #[test]
    fn short_page_does_not_prefetch() {
        let transport = FakeItems::new(12);
        let mut cache = QueryCache::new();
        let mut table = ItemsTable::new(3, 5, NextPagePolicy::FullPage);

        table.load(&client(), &mut cache, &transport).unwrap();
        assert_eq!(table.rows().len(), 2);
        assert_eq!(transport.requests(), vec!["http://api/api/v1/items/?skip=10&limit=5"]);
        assert!(!table.has_next());
        assert!(table.has_previous());
    }

    #[test]
    fn prefetched_page_is_served_from_cache() {
        let transport = FakeItems::new(12);
        let mut cache = QueryCache::new();
        let mut table = ItemsTable::new(1, 5, NextPagePolicy::FullPage);
        table.load(&client(), &mut cache, &transport).unwrap();

        assert!(table.next_page());
        table.load(&client(), &mut cache, &transport).unwrap();
        // page 2 was prefetched; only page 3 is new
        assert_eq!(transport.requests().len(), 3);
        assert_eq!(transport.requests()[2], "http://api/api/v1/items/?skip=10&limit=5");
    }

    #[test]
    fn previous_rows_stay_while_loading() {
        let transport = FakeItems::new(30);
        let mut cache = QueryCache::new();
        let mut table = ItemsTable::new(1, 5, NextPagePolicy::FullPage);
        table.load(&client(), &mut cache, &transport).unwrap();
        let first_rows = table.rows().to_vec();

        table.set_page(5);
        assert!(table.is_placeholder());
        assert_eq!(table.rows(), first_rows.as_slice());
        assert!(!table.has_next(), "next is disabled on placeholder data");

        table.load(&client(), &mut cache, &transport).unwrap();
        assert!(!table.is_placeholder());
        assert_eq!(table.rows()[0].title, "item 20");
    }

    #[test]
    fn exact_boundary_depends_on_policy() {
        let transport = FakeItems::new(10);
        let mut cache = QueryCache::new();
        let mut loose = ItemsTable::new(2, 5, NextPagePolicy::FullPage);
        loose.load(&client(), &mut cache, &transport).unwrap();
        assert!(loose.has_next());

        let mut strict = ItemsTable::new(2, 5, NextPagePolicy::ExactCount);
        strict.load(&client(), &mut cache, &transport).unwrap();
        assert!(!strict.has_next());
        assert_eq!(strict.label(), "Page 2 of 2");
    }

    #[test]
    fn sans_io_flow_matches_load() {
        let transport = FakeItems::new(7);
        let c = client();
        let mut cache = QueryCache::new();
        let mut table = ItemsTable::new(1, 5, NextPagePolicy::FullPage);

        let req = table.begin_load(&c, &mut cache).unwrap();
        assert!(table.begin_load(&c, &mut cache).is_none(), "in flight");
        let resp = transport.execute(req).unwrap();
        table.finish_load(&c, &mut cache, 1, resp).unwrap();
        assert_eq!(table.rows().len(), 5);

        let (page, req) = table.prefetch_request(&c, &mut cache).unwrap();
        assert_eq!(page, 2);
        assert_eq!(req.path, "http://api/api/v1/items/?skip=5&limit=5");
    }

    #[test]
    fn invalidation_forces_refetch() {
        let transport = FakeItems::new(3);
        let mut cache = QueryCache::new();
        let mut table = ItemsTable::new(1, 5, NextPagePolicy::FullPage);
        table.load(&client(), &mut cache, &transport).unwrap();
        table.load(&client(), &mut cache, &transport).unwrap();
        assert_eq!(transport.requests().len(), 1);

        cache.invalidate(ITEMS);
        table.load(&client(), &mut cache, &transport).unwrap();
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn mutation_during_load_forces_refetch() {
        let transport = FakeItems::new(3);
        let mut ctx = ctx();
        let mut table = ItemsTable::new(1, 5, NextPagePolicy::FullPage);

        let req = table.begin_load(&ctx.client, &mut ctx.cache).unwrap();
        let stale_page = transport.execute(req).unwrap();

        let created = Recorder::replying(
            200,
            r#"{"id":"00000000-0000-0000-0000-0000000000ff","title":"New","description":"","owner_id":"00000000-0000-0000-0000-000000000000"}"#,
        );
        Form::new(AddItemForm::new("New", "")).submit(&mut ctx, &created).unwrap();

        table.finish_load(&ctx.client, &mut ctx.cache, 1, stale_page).unwrap();
        assert_eq!(table.rows().len(), 3, "the older answer is still shown");
        assert!(!ctx.cache.is_fresh(&table.key()));
        assert!(table.begin_load(&ctx.client, &mut ctx.cache).is_some());
    }

    #[test]
    fn next_page_stops_at_the_last_page_number() {
        let transport = FakeItems::new(u64::MAX);
        let mut cache = QueryCache::new();
        let mut table = ItemsTable::new(u32::MAX, 5, NextPagePolicy::FullPage);
        table.load(&client(), &mut cache, &transport).unwrap();
        assert_eq!(table.rows().len(), 5);
        assert!(!table.next_page());
        assert_eq!(table.page(), u32::MAX);
    }

    #[test]
    fn user_rows_mark_current_user() {
        let me = UserPublic {
            id: Uuid::from_u128(1),
            email: "me@example.com".to_string(),
            full_name: None,
            is_active: true,
            is_superuser: true,
        };
        let other = UserPublic {
            id: Uuid::from_u128(2),
            email: "other@example.com".to_string(),
            full_name: Some("Other".to_string()),
            is_active: false,
            is_superuser: false,
        };
        let rows = user_rows(&[me.clone(), other], Some(&me));
        assert_eq!(rows[0].full_name, "N/A");
        assert_eq!(rows[0].role, "Superuser");
        assert!(rows[0].is_current && !rows[0].actions_enabled);
        assert_eq!(rows[1].status, "Inactive");
        assert!(rows[1].actions_enabled);
    }
}
