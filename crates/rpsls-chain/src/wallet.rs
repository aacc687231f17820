//! Wallet provider abstraction.

use crate::contract::ChainError;
use alloy_primitives::Address;
use rand::RngCore;

/// Source of the account every write is signed for
pub trait Wallet: Send + Sync {
    fn connect(&mut self) -> Result<Address, ChainError>;

    fn disconnect(&mut self);

    /// Connected account, if any
    fn account(&self) -> Option<Address>;

    fn require_account(&self) -> Result<Address, ChainError> {
        self.account().ok_or(ChainError::NotConnected)
    }
}

/// A single configured account whose key lives with the node
#[derive(Clone, Debug)]
pub struct LocalWallet {
    address: Address,
    connected: bool,
}

impl LocalWallet {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            connected: false,
        }
    }

    /// Throwaway account, used with the mock chain
    pub fn random() -> Self {
        let mut bytes = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::new(Address::from(bytes))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Switch to another account; the wallet stays disconnected until
    /// `connect` is called again.
    pub fn select(&mut self, address: Address) {
        self.address = address;
        self.connected = false;
    }
}

impl Wallet for LocalWallet {
    fn connect(&mut self) -> Result<Address, ChainError> {
        self.connected = true;
        Ok(self.address)
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn account(&self) -> Option<Address> {
        self.connected.then_some(self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_disconnect() {
        let mut wallet = LocalWallet::new(Address::repeat_byte(7));
        assert!(matches!(
            wallet.require_account(),
            Err(ChainError::NotConnected)
        ));

        assert_eq!(wallet.connect().unwrap(), Address::repeat_byte(7));
        assert_eq!(wallet.account(), Some(Address::repeat_byte(7)));

        wallet.disconnect();
        assert_eq!(wallet.account(), None);
    }

    #[test]
    fn test_random_wallets_differ() {
        assert_ne!(LocalWallet::random().address(), LocalWallet::random().address());
    }
}
