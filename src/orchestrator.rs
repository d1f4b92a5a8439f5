//! Submission orchestration
//!
//! Wraps a broadcast with the UI contract: loading flag on, broadcast,
//! feedback per outcome, nonce bookkeeping and revalidation on success,
//! then loading flag off and back home no matter what happened.

use crate::broadcast::{broadcast_transaction, failure_message, BroadcastOutcome};
use crate::client::NodeClient;
use crate::error::WalletError;
use crate::network::StacksNetwork;
use crate::transaction::SignedTransaction;
use async_trait::async_trait;
use num_bigint::BigUint;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

pub const SUCCESS_MESSAGE: &str = "Transaction submitted!";

/// UI hooks driven by the orchestrator
#[async_trait(?Send)]
pub trait SubmissionFeedback {
    fn set_loading(&self, loading: bool);
    fn toast_success(&self, message: &str);
    fn toast_error(&self, message: &str);
    /// Refresh data that depends on the account (balances, history)
    async fn revalidate(&self, account_address: &str);
    fn navigate_home(&self);
}

/// Last nonce used per account
#[derive(Debug, Default)]
pub struct NonceTracker {
    last: HashMap<String, BigUint>,
}

impl NonceTracker {
    /// Remember `nonce` unless a later one is already recorded
    pub fn record(&mut self, address: &str, nonce: &BigUint) {
        if !matches!(self.last.get(address), Some(last) if last >= nonce) {
            self.last.insert(address.to_string(), nonce.clone());
        }
    }

    pub fn last(&self, address: &str) -> Option<&BigUint> {
        self.last.get(address)
    }

    /// Nonce for the next transaction: the node's view, or one past the
    /// last one submitted from here if that is further ahead
    pub fn next_nonce(&self, address: &str, network_nonce: BigUint) -> BigUint {
        match self.last(address) {
            Some(last) => network_nonce.max(last.clone() + 1u32),
            None => network_nonce,
        }
    }
}

/// Clears the loading flag and navigates home when dropped
struct LoadingGuard<'a, F: SubmissionFeedback + ?Sized> {
    feedback: &'a F,
}

impl<'a, F: SubmissionFeedback + ?Sized> LoadingGuard<'a, F> {
    fn start(feedback: &'a F) -> Self {
        feedback.set_loading(true);
        LoadingGuard { feedback }
    }
}

impl<F: SubmissionFeedback + ?Sized> Drop for LoadingGuard<'_, F> {
    fn drop(&mut self) {
        self.feedback.set_loading(false);
        self.feedback.navigate_home();
    }
}

pub struct SubmissionOrchestrator<C: NodeClient, F: SubmissionFeedback> {
    client: C,
    feedback: F,
    nonces: Mutex<NonceTracker>,
}

impl<C: NodeClient, F: SubmissionFeedback> SubmissionOrchestrator<C, F> {
    pub fn new(client: C, feedback: F) -> Self {
        SubmissionOrchestrator {
            client,
            feedback,
            nonces: Mutex::new(NonceTracker::default()),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    /// Nonce to build the account's next transaction with
    pub async fn next_nonce(
        &self,
        account_address: &str,
        network: &StacksNetwork,
    ) -> Result<BigUint, WalletError> {
        let nonces = self.nonces.lock().await;
        let network_nonce = self.client.account_nonce(network, account_address).await?;
        Ok(nonces.next_nonce(account_address, network_nonce))
    }

    /// Broadcast `transaction` (if any) and drive the feedback hooks.
    ///
    /// Submissions through one orchestrator run one at a time.
    pub async fn submit(
        &self,
        account_address: &str,
        transaction: Option<&SignedTransaction>,
        network: &StacksNetwork,
    ) -> Result<Option<BroadcastOutcome>, WalletError> {
        let mut nonces = self.nonces.lock().await;
        let _guard = LoadingGuard::start(&self.feedback);

        let Some(transaction) = transaction else {
            debug!("Nothing to submit");
            return Ok(None);
        };

        match broadcast_transaction(&self.client, transaction, network).await {
            Ok(outcome) => {
                nonces.record(account_address, transaction.nonce());
                self.feedback.toast_success(SUCCESS_MESSAGE);
                self.feedback.revalidate(account_address).await;
                Ok(Some(outcome))
            }
            Err(err) => {
                self.feedback.toast_error(failure_message(&err));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockNodeClient;
    use crate::network::TransactionVersion;
    use crate::post_condition::PostConditionMode;
    use crate::transaction::{AnchorMode, SpendingCondition, StacksTransaction, TxPayload};
    use k256::ecdsa::SigningKey;
    use std::cell::RefCell;

    const ADDRESS: &str = "ST2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQ9H6DPR";

    #[derive(Default)]
    struct RecordingFeedback {
        events: RefCell<Vec<String>>,
    }

    impl RecordingFeedback {
        fn events(&self) -> Vec<String> {
            self.events.borrow().clone()
        }

        fn push(&self, event: String) {
            self.events.borrow_mut().push(event);
        }
    }

    #[async_trait(?Send)]
    impl SubmissionFeedback for RecordingFeedback {
        fn set_loading(&self, loading: bool) {
            self.push(format!("loading:{}", loading));
        }

        fn toast_success(&self, message: &str) {
            self.push(format!("success:{}", message));
        }

        fn toast_error(&self, message: &str) {
            self.push(format!("error:{}", message));
        }

        async fn revalidate(&self, account_address: &str) {
            self.push(format!("revalidate:{}", account_address));
        }

        fn navigate_home(&self) {
            self.push("home".to_string());
        }
    }

    fn signed(nonce: u64) -> SignedTransaction {
        let key = SigningKey::from_slice(&[8u8; 32]).unwrap();
        let mut tx = StacksTransaction {
            version: TransactionVersion::Testnet,
            chain_id: TransactionVersion::Testnet.default_chain_id(),
            auth: SpendingCondition::new(key.verifying_key(), nonce, 200),
            anchor_mode: AnchorMode::Any,
            post_condition_mode: PostConditionMode::Deny,
            post_conditions: Vec::new(),
            payload: TxPayload::TokenTransfer {
                recipient: ADDRESS.parse().unwrap(),
                amount: BigUint::from(1u32),
                memo: [0u8; 34],
            },
        };
        tx.sign(&key).unwrap();
        tx.into_signed().unwrap()
    }

    fn network() -> StacksNetwork {
        StacksNetwork::new(TransactionVersion::Testnet, "http://node.test")
    }

    #[tokio::test]
    async fn test_success_flow() {
        let orchestrator =
            SubmissionOrchestrator::new(MockNodeClient::new(), RecordingFeedback::default());
        orchestrator.client().accept("feed");

        let outcome = orchestrator
            .submit(ADDRESS, Some(&signed(4)), &network())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.transaction_id, "0xfeed");
        assert_eq!(
            orchestrator.feedback().events(),
            vec![
                "loading:true".to_string(),
                format!("success:{}", SUCCESS_MESSAGE),
                format!("revalidate:{}", ADDRESS),
                "loading:false".to_string(),
                "home".to_string(),
            ]
        );

        // node still reports 4, local bookkeeping is ahead
        orchestrator.client().set_nonce(ADDRESS, 4);
        assert_eq!(
            orchestrator.next_nonce(ADDRESS, &network()).await.unwrap(),
            BigUint::from(5u32)
        );
    }

    #[tokio::test]
    async fn test_rejection_flow() {
        let orchestrator =
            SubmissionOrchestrator::new(MockNodeClient::new(), RecordingFeedback::default());
        orchestrator.client().reject("RejectTransaction", "BadNonce");

        let err = orchestrator
            .submit(ADDRESS, Some(&signed(1)), &network())
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::BroadcastRejected { .. }));
        assert_eq!(
            orchestrator.feedback().events(),
            vec!["loading:true", "error:Incorrect nonce.", "loading:false", "home"]
        );

        // rejected submissions are not tracked
        orchestrator.client().set_nonce(ADDRESS, 1);
        assert_eq!(
            orchestrator.next_nonce(ADDRESS, &network()).await.unwrap(),
            BigUint::from(1u32)
        );
    }

    #[tokio::test]
    async fn test_unclassified_failure_message() {
        let orchestrator =
            SubmissionOrchestrator::new(MockNodeClient::new(), RecordingFeedback::default());
        orchestrator.client().push_transport_error("offline");

        assert!(orchestrator
            .submit(ADDRESS, Some(&signed(0)), &network())
            .await
            .is_err());
        assert_eq!(
            orchestrator.feedback().events(),
            vec!["loading:true", "error:Something went wrong", "loading:false", "home"]
        );
    }

    #[tokio::test]
    async fn test_no_transaction_still_cleans_up() {
        let orchestrator =
            SubmissionOrchestrator::new(MockNodeClient::new(), RecordingFeedback::default());
        assert_eq!(orchestrator.submit(ADDRESS, None, &network()).await.unwrap(), None);
        assert_eq!(
            orchestrator.feedback().events(),
            vec!["loading:true", "loading:false", "home"]
        );
        assert!(orchestrator.client().posted().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_submissions_serialize() {
        let orchestrator =
            SubmissionOrchestrator::new(MockNodeClient::new(), RecordingFeedback::default());
        orchestrator.client().accept("aa");
        orchestrator.client().accept("bb");

        let first = signed(0);
        let second = signed(1);
        let net = network();
        let (a, b) = tokio::join!(
            orchestrator.submit(ADDRESS, Some(&first), &net),
            orchestrator.submit(ADDRESS, Some(&second), &net),
        );
        assert!(a.is_ok() && b.is_ok());

        let loading: Vec<String> = orchestrator
            .feedback()
            .events()
            .into_iter()
            .filter(|e| e.starts_with("loading"))
            .collect();
        assert_eq!(
            loading,
            vec!["loading:true", "loading:false", "loading:true", "loading:false"]
        );
    }

    #[test]
    fn test_nonce_tracker() {
        let mut tracker = NonceTracker::default();
        assert_eq!(tracker.next_nonce(ADDRESS, BigUint::from(3u32)), BigUint::from(3u32));

        tracker.record(ADDRESS, &BigUint::from(0u32));
        assert_eq!(tracker.next_nonce(ADDRESS, BigUint::ZERO), BigUint::from(1u32));

        tracker.record(ADDRESS, &BigUint::from(9u32));
        tracker.record(ADDRESS, &BigUint::from(2u32));
        assert_eq!(tracker.last(ADDRESS), Some(&BigUint::from(9u32)));
        assert_eq!(tracker.next_nonce(ADDRESS, BigUint::from(20u32)), BigUint::from(20u32));
    }
}
