//! Service handles shared through context.
//!
//! SYSTEM CONTEXT
//! ==============
//! Built once by `App`. Components use these to act (sign in, sign out,
//! switch locale, check the route guard); they read state from the mirrored
//! signals instead.

use std::sync::Arc;

use portal::auth::AuthBridge;
use portal::config::PortalConfig;
use portal::guard::RouteGuard;
use portal::locale::LocaleContext;
use portal::session::SessionStore;

use crate::net::identity::FirebaseIdentity;

#[derive(Clone, Debug)]
pub struct PortalServices {
    pub config: Arc<PortalConfig>,
    pub session: SessionStore,
    pub identity: Arc<FirebaseIdentity>,
    pub bridge: Arc<AuthBridge>,
    pub locale: Arc<LocaleContext>,
    pub guard: RouteGuard,
}
