use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    DefaultKeyedRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{RateLimitConfig, Window};
use crate::error::KomikError;
use crate::router::KomikState;

type IpLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// Quota admitting a burst of `limit` requests, then one more every
/// `window_secs / limit`. Cells refill continuously rather than at window
/// boundaries, so any span of `window_secs` admits at most `2 * limit - 1`
/// requests, and a sustained rate never exceeds `limit` per window.
pub fn window_quota(window: Window) -> Quota {
    let limit = NonZeroU32::new(window.limit.max(1)).unwrap_or(NonZeroU32::MIN);
    let span = Duration::from_secs(window.window_secs.max(1));
    Quota::with_period(span / limit.get())
        .map(|q| q.allow_burst(limit))
        .unwrap_or_else(|| Quota::per_second(limit))
}

/// Per-client limiters for each route tier.
pub struct RateLimits {
    enabled: bool,
    global: Vec<(&'static str, IpLimiter)>,
    auth: IpLimiter,
    clock: DefaultClock,
}

impl RateLimits {
    pub fn new(cfg: &RateLimitConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            global: vec![
                ("short", RateLimiter::keyed(window_quota(cfg.short))),
                ("medium", RateLimiter::keyed(window_quota(cfg.medium))),
                ("long", RateLimiter::keyed(window_quota(cfg.long))),
            ],
            auth: RateLimiter::keyed(window_quota(cfg.auth)),
            clock: DefaultClock::default(),
        }
    }

    fn check(&self, limiter: &IpLimiter, tier: &str, ip: IpAddr) -> Result<(), KomikError> {
        limiter.check_key(&ip).map_err(|not_until| {
            let retry_after = not_until.wait_time_from(self.clock.now());
            warn!(%ip, tier, retry_after_ms = retry_after.as_millis() as u64, "rate limit exceeded");
            KomikError::RateLimited { retry_after }
        })
    }

    pub fn check_global(&self, ip: IpAddr) -> Result<(), KomikError> {
        if !self.enabled {
            return Ok(());
        }
        for (tier, limiter) in &self.global {
            self.check(limiter, tier, ip)?;
        }
        Ok(())
    }

    pub fn check_auth(&self, ip: IpAddr) -> Result<(), KomikError> {
        if !self.enabled {
            return Ok(());
        }
        self.check(&self.auth, "auth", ip)
    }

    /// Periodically drop state for clients that are back under every limit.
    pub fn spawn_janitor(self: &Arc<Self>, every: Duration) {
        let limits = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let Some(limits) = limits.upgrade() else {
                    info!("rate limit janitor stopped");
                    break;
                };
                for (_, limiter) in &limits.global {
                    limiter.retain_recent();
                    limiter.shrink_to_fit();
                }
                limits.auth.retain_recent();
                limits.auth.shrink_to_fit();
            }
        });
    }
}

fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Applied to every route.
pub async fn global_limit(
    State(state): State<KomikState>,
    req: Request,
    next: Next,
) -> Result<Response, KomikError> {
    state.limits.check_global(client_ip(&req))?;
    Ok(next.run(req).await)
}

/// Applied to credential endpoints on top of the global tier.
pub async fn auth_limit(
    State(state): State<KomikState>,
    req: Request,
    next: Next,
) -> Result<Response, KomikError> {
    state.limits.check_auth(client_ip(&req))?;
    Ok(next.run(req).await)
}
