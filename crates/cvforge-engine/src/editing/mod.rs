/*!
 * # Document editing core
 *
 * The host side of the editor owns exactly one [`DocumentStore`]. It is the
 * only writable copy of the document: the preview surface holds a replica
 * that is replaced wholesale from [`Snapshot`]s and never patched.
 *
 * ## Flow
 *
 * 1. An edit calls a store operation (`add_section`, `update_section_field`, ...).
 * 2. The store commits the change and synchronously hands the full state to
 *    every subscriber.
 * 3. Subscribers (the preview bridge, autosave) act on that state; none of
 *    them can mutate the store from inside the notification.
 *
 * ```rust
 * use cvforge_engine::editing::DocumentStore;
 * use cvforge_engine::models::SectionField;
 *
 * let mut store = DocumentStore::new();
 * let id = store.add_section();
 * store.update_section_field(&id, SectionField::Content, "# Jane Doe");
 * assert_eq!(store.snapshot().sections[0].content, "# Jane Doe");
 * ```
 */

pub mod snapshot;
pub mod store;

pub use snapshot::Snapshot;
pub use store::{DocumentStore, Listener, RestoreSelection, SubscriptionId};
