//! Collection mechanism handling and stall reactions

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;

use comms_if::eqpt::{ActCmd, ActStatus};

use super::{
    state::Tick,
    ActLink, CollectState, NavCtrl, NavEvent, Recovery,
};

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NavCtrl {
    /// Start the collector if needed and react to at most one status notification.
    pub(super) fn handle_collecting<L: ActLink + ?Sized>(&mut self, tick: &mut Tick<L>) {
        if self.collect == CollectState::Idle {
            self.collect = CollectState::Collecting;
            tick.send(self.collect_cmd());
        }

        let status = match tick.poll_status() {
            Some(s) => s,
            None => return,
        };

        tick.out.events.push(NavEvent::CollectorStalled(status));

        match status {
            // Stop the inner motor and give up on the rest of the path
            ActStatus::StalledInner => {
                info!("Inner collector stalled, abandoning {} targets", self.targets.len());

                self.collect = CollectState::InnerStalled;
                tick.send(ActCmd::Collect {
                    inner_speed: 0,
                    outer_speed: self.params.collect_outer_speed,
                });
                self.targets.clear();
            }

            // Back off and try again, restarting the collector on the way
            ActStatus::StalledOuter => {
                info!("Outer collector stalled");

                if self.collect == CollectState::Collecting {
                    self.collect = CollectState::Idle;
                }

                if self.recovery != Recovery::ReverseArmed {
                    self.targets.clear();
                    self.recovery = Recovery::ReverseArmed;
                }
            }
        }
    }
}
