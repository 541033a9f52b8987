use salvo::async_trait;

use timeledger_core::error::CoreError;
use timeledger_service::admin::AdminService;
use timeledger_service::schedule::ScheduleService;

use crate::error::AppResult;

/// Makes the schedule service available to every handler below it.
pub struct ScheduleServiceHandler {
    pub service: ScheduleService,
}

#[async_trait]
impl salvo::Handler for ScheduleServiceHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.service.clone());
    }
}

/// ## Summary
/// Retrieves the schedule service from the depot.
///
/// ## Errors
/// Returns an error if no service was injected.
pub fn get_service_from_depot(depot: &salvo::Depot) -> AppResult<ScheduleService> {
    depot
        .obtain::<ScheduleService>()
        .cloned()
        .map_err(|_err| CoreError::MissingComponent("Schedule service not found in depot").into())
}

/// Makes the admin service available to the rule and exception routes.
pub struct AdminServiceHandler {
    pub service: AdminService,
}

#[async_trait]
impl salvo::Handler for AdminServiceHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.service.clone());
    }
}

/// ## Summary
/// Retrieves the admin service from the depot.
///
/// ## Errors
/// Returns an error if no service was injected.
pub fn get_admin_service_from_depot(depot: &salvo::Depot) -> AppResult<AdminService> {
    depot
        .obtain::<AdminService>()
        .cloned()
        .map_err(|_err| CoreError::MissingComponent("Admin service not found in depot").into())
}
