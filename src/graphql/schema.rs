use crate::graphql::loaders::{CategoryLoader, MonthLoader};
use crate::graphql::resolvers::{Mutation, Query};
use crate::service::BudgetService;
use async_graphql::dataloader::DataLoader;
use async_graphql::{EmptySubscription, Schema};

/// GraphQL context containing shared application state
pub struct GraphQLContext {
    pub service: BudgetService,
    pub category_loader: DataLoader<CategoryLoader>,
    pub month_loader: DataLoader<MonthLoader>,
}

/// The complete GraphQL schema
pub type GraphQLSchema = Schema<Query, Mutation, EmptySubscription>;

/// Create a new GraphQL schema backed by the given service.
///
/// The request's [`Viewer`](crate::auth::Viewer), when there is one, is
/// attached per request with `Request::data`.
pub fn create_schema(service: BudgetService) -> GraphQLSchema {
    let storage = service.storage().clone();
    Schema::build(Query, Mutation, EmptySubscription)
        .data(GraphQLContext {
            category_loader: CategoryLoader::new(storage.clone()),
            month_loader: MonthLoader::new(storage),
            service,
        })
        .finish()
}
