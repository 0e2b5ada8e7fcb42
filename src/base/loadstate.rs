/// The current state of one connect attempt.
/// Loosely follows net/base/load_states.h, narrowed to the tunnel path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectState {
    /// Nothing has started yet.
    #[default]
    Idle,

    /// Resolving the destination host on the client.
    ResolvingHost,

    /// Dialing the first proxy and running the SOCKS handshakes.
    EstablishingProxyTunnel,

    /// Running the TLS handshake over the tunnel.
    SslHandshake,

    /// A socket has been handed to the caller.
    Ready,

    /// The attempt failed.
    Failed,
}

impl ConnectState {
    /// Returns true once the attempt can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectState::Ready | ConnectState::Failed)
    }

    /// Checks whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: ConnectState) -> bool {
        use ConnectState::*;
        match (self, next) {
            (Ready | Failed, _) => false,
            (_, Failed) => true,
            (Idle, ResolvingHost | EstablishingProxyTunnel) => true,
            (ResolvingHost, EstablishingProxyTunnel) => true,
            (EstablishingProxyTunnel, SslHandshake | Ready) => true,
            (SslHandshake, Ready) => true,
            _ => false,
        }
    }
}
