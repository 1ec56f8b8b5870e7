//! Booking provider client: trait, reqwest implementation and an
//! in-memory implementation for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{BookingId, ContactId, InvoiceId, RoomStayId};
use domain::{GuestDetails, RoomStayStatus};

use crate::auth::TokenSource;
use crate::config::BookingProviderConfig;
use crate::error::ProviderError;
use crate::types::{
    AvailabilityQuery, Booking, Building, Contact, Invoice, NewBooking, PaymentRecord,
    PropertyAvailability, RateOffer, RoomStay,
};

/// Operations the saga needs from the booking provider.
///
/// Every call consumes one bearer token and carries the client's
/// bounded timeout. No call is retried internally.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Creates (or transparently reuses) a contact for the guest.
    async fn create_contact(&self, guest: &GuestDetails) -> Result<Contact, ProviderError>;

    /// Creates a booking with a single room stay in `ENQUIRY` state.
    async fn create_booking(&self, request: &NewBooking) -> Result<Booking, ProviderError>;

    /// Loads a booking. If the provider omits the room stays, they are
    /// fetched separately and merged in.
    async fn booking(&self, id: BookingId) -> Result<Booking, ProviderError>;

    /// Room stays of a booking, looked up directly.
    async fn room_stays(&self, booking_id: BookingId) -> Result<Vec<RoomStay>, ProviderError>;

    /// Transitions one room stay to a new status.
    async fn update_room_stay_status(
        &self,
        booking_id: BookingId,
        room_stay_id: RoomStayId,
        status: RoomStayStatus,
    ) -> Result<(), ProviderError>;

    /// Invoices attached to a booking. An empty list is normal.
    async fn booking_invoices(&self, booking_id: BookingId)
        -> Result<Vec<Invoice>, ProviderError>;

    /// Posts a draft invoice.
    async fn post_invoice(&self, invoice_id: InvoiceId) -> Result<(), ProviderError>;

    /// Records a payment against a booking. On the Stripe rail this
    /// moves no money; the charge already happened upstream.
    async fn create_payment(
        &self,
        booking_id: BookingId,
        record: &PaymentRecord,
    ) -> Result<(), ProviderError>;

    /// Payments recorded against a booking.
    async fn booking_payments(
        &self,
        booking_id: BookingId,
    ) -> Result<Vec<PaymentRecord>, ProviderError>;

    /// Availability for one published rate code.
    async fn search_availability(
        &self,
        rate_code: &str,
        query: &AvailabilityQuery,
    ) -> Result<Vec<PropertyAvailability>, ProviderError>;

    /// All bookable buildings.
    async fn buildings(&self) -> Result<Vec<Building>, ProviderError>;
}

// ---------------------------------------------------------------------------
// reqwest implementation
// ---------------------------------------------------------------------------

/// reqwest-backed client for the ResHarmonics-style booking API.
pub struct ResHarmonicsClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenSource,
}

impl ResHarmonicsClient {
    pub fn new(config: BookingProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let tokens = TokenSource::new(http.clone(), config);
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn authorized(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ProviderError> {
        let token = self.tokens.bearer_token().await?;
        Ok(builder.bearer_auth(token).send().await?)
    }
}

/// Reads the response body on a non-2xx status and maps it through the
/// operation's error constructor.
async fn ensure_success(
    response: reqwest::Response,
    to_error: fn(String) -> ProviderError,
) -> Result<reqwest::Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(to_error(format!("provider returned {status}: {body}")))
}

#[async_trait]
impl BookingApi for ResHarmonicsClient {
    #[tracing::instrument(skip(self, guest), fields(email = %guest.email))]
    async fn create_contact(&self, guest: &GuestDetails) -> Result<Contact, ProviderError> {
        let payload = wire::ContactPayload::from_guest(guest);
        let response = self
            .authorized(self.http.post(self.url("/api/v3/contacts")).json(&payload))
            .await?;
        let response = ensure_success(response, ProviderError::ContactCreation).await?;
        let contact: wire::ContactWire = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("contact body: {e}")))?;
        Ok(contact.into())
    }

    #[tracing::instrument(skip(self, request))]
    async fn create_booking(&self, request: &NewBooking) -> Result<Booking, ProviderError> {
        let payload = wire::BookingPayload::from_request(request);
        let response = self
            .authorized(self.http.post(self.url("/api/v3/bookings")).json(&payload))
            .await?;
        let response = ensure_success(response, ProviderError::BookingCreation).await?;
        let booking: wire::BookingWire = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("booking body: {e}")))?;
        Ok(booking.into())
    }

    #[tracing::instrument(skip(self))]
    async fn booking(&self, id: BookingId) -> Result<Booking, ProviderError> {
        let response = self
            .authorized(self.http.get(self.url(&format!("/api/v3/bookings/{id}"))))
            .await?;
        let response = ensure_success(response, ProviderError::Lookup).await?;
        let booking: wire::BookingWire = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("booking body: {e}")))?;
        let mut booking: Booking = booking.into();

        // Some provider responses omit the embedded room stays.
        if booking.room_stays.is_empty() {
            booking.room_stays = self.room_stays(id).await?;
        }
        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn room_stays(&self, booking_id: BookingId) -> Result<Vec<RoomStay>, ProviderError> {
        let response = self
            .authorized(
                self.http
                    .get(self.url(&format!("/api/v3/bookings/{booking_id}/roomStays"))),
            )
            .await?;
        let response = ensure_success(response, ProviderError::Lookup).await?;
        let stays: Vec<wire::RoomStayWire> = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("room stays body: {e}")))?;
        Ok(stays.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn update_room_stay_status(
        &self,
        booking_id: BookingId,
        room_stay_id: RoomStayId,
        status: RoomStayStatus,
    ) -> Result<(), ProviderError> {
        let payload = wire::StatusUpdatePayload::single(room_stay_id, status);
        let response = self
            .authorized(
                self.http
                    .post(self.url(&format!("/api/v3/bookings/{booking_id}/status")))
                    .json(&payload),
            )
            .await?;
        ensure_success(response, ProviderError::StatusUpdate).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn booking_invoices(
        &self,
        booking_id: BookingId,
    ) -> Result<Vec<Invoice>, ProviderError> {
        let response = self
            .authorized(
                self.http
                    .get(self.url(&format!("/api/v3/bookings/{booking_id}/invoices"))),
            )
            .await?;
        let response = ensure_success(response, ProviderError::Lookup).await?;
        let invoices: Vec<wire::InvoiceWire> = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("invoices body: {e}")))?;
        Ok(invoices.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn post_invoice(&self, invoice_id: InvoiceId) -> Result<(), ProviderError> {
        let response = self
            .authorized(
                self.http
                    .post(self.url(&format!("/api/v3/invoices/{invoice_id}/post"))),
            )
            .await?;
        ensure_success(response, ProviderError::InvoicePosting).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, record), fields(reference = %record.payment_reference))]
    async fn create_payment(
        &self,
        booking_id: BookingId,
        record: &PaymentRecord,
    ) -> Result<(), ProviderError> {
        let payload = wire::PaymentPayload::from_record(record);
        let response = self
            .authorized(
                self.http
                    .post(self.url(&format!("/api/v3/bookings/{booking_id}/payments")))
                    .json(&payload),
            )
            .await?;
        ensure_success(response, ProviderError::PaymentRecording).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn booking_payments(
        &self,
        booking_id: BookingId,
    ) -> Result<Vec<PaymentRecord>, ProviderError> {
        let response = self
            .authorized(
                self.http
                    .get(self.url(&format!("/api/v3/bookings/{booking_id}/payments"))),
            )
            .await?;
        let response = ensure_success(response, ProviderError::Lookup).await?;
        let payments: Vec<wire::PaymentWire> = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("payments body: {e}")))?;
        Ok(payments.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(skip(self, query))]
    async fn search_availability(
        &self,
        rate_code: &str,
        query: &AvailabilityQuery,
    ) -> Result<Vec<PropertyAvailability>, ProviderError> {
        let response = self
            .authorized(
                self.http
                    .get(self.url("/api/v3/rates/availability"))
                    .query(&[
                        ("dateFrom", query.start_date.to_string()),
                        ("dateTo", query.end_date.to_string()),
                        ("guests", query.guests.to_string()),
                        ("rateCode", rate_code.to_string()),
                        ("inventoryType", "UNIT_TYPE".to_string()),
                    ]),
            )
            .await?;
        let response = ensure_success(response, ProviderError::Lookup).await?;
        let page: wire::AvailabilityPage = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("availability body: {e}")))?;
        Ok(page.content.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn buildings(&self) -> Result<Vec<Building>, ProviderError> {
        let response = self
            .authorized(self.http.get(self.url("/api/v3/buildings")))
            .await?;
        let response = ensure_success(response, ProviderError::Lookup).await?;
        let page: wire::BuildingsPage = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("buildings body: {e}")))?;
        Ok(page.content.into_iter().map(Into::into).collect())
    }
}

// ---------------------------------------------------------------------------
// Wire DTOs. Provider-owned shapes, versioned contracts; nothing outside
// this module depends on them.
// ---------------------------------------------------------------------------

mod wire {
    use common::Money;
    use serde::{Deserialize, Serialize};

    use super::{
        Booking, Building, Contact, GuestDetails, Invoice, NewBooking, PaymentRecord,
        PropertyAvailability, RateOffer, RoomStay, RoomStayId, RoomStayStatus,
    };

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct ContactPayload {
        first_name: String,
        last_name: String,
        primary_email_address: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        primary_telephone_number: Option<String>,
        contact_email_addresses: Vec<EmailEntry>,
        contact_telephone_numbers: Vec<PhoneEntry>,
        contact_type: &'static str,
        contact_addresses: Vec<serde_json::Value>,
    }

    #[derive(Serialize)]
    struct EmailEntry {
        email: String,
        primary: bool,
        #[serde(rename = "type")]
        kind: &'static str,
    }

    #[derive(Serialize)]
    struct PhoneEntry {
        number: String,
        primary: bool,
        #[serde(rename = "type")]
        kind: &'static str,
    }

    impl ContactPayload {
        pub(super) fn from_guest(guest: &GuestDetails) -> Self {
            Self {
                first_name: guest.first_name.clone(),
                last_name: guest.last_name.clone(),
                primary_email_address: guest.email.clone(),
                primary_telephone_number: guest.phone.clone(),
                contact_email_addresses: vec![EmailEntry {
                    email: guest.email.clone(),
                    primary: true,
                    kind: "PERSONAL",
                }],
                contact_telephone_numbers: guest
                    .phone
                    .iter()
                    .map(|number| PhoneEntry {
                        number: number.clone(),
                        primary: true,
                        kind: "MOBILE",
                    })
                    .collect(),
                contact_type: "GUEST",
                contact_addresses: Vec::new(),
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct ContactWire {
        id: i64,
        #[serde(default)]
        finance_account_id: Option<i64>,
    }

    impl From<ContactWire> for Contact {
        fn from(wire: ContactWire) -> Self {
            Contact {
                id: wire.id.into(),
                finance_account_id: wire.finance_account_id,
            }
        }
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct BookingPayload {
        booking_contact_id: i64,
        billing_contact_id: i64,
        booking_finance_account_id: i64,
        billing_finance_account_id: i64,
        billing_frequency_id: i64,
        booking_type_id: i64,
        channel_id: i64,
        notes: String,
        room_stays: Vec<RoomStayPayload>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct RoomStayPayload {
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
        number_of_adults: u32,
        number_of_children: u32,
        number_of_infants: u32,
        rate_id: i64,
        inventory_type: &'static str,
        inventory_type_id: i64,
    }

    impl BookingPayload {
        pub(super) fn from_request(request: &NewBooking) -> Self {
            let contact_id = request.contact.id.value();
            let finance_account = request.contact.finance_account();
            Self {
                booking_contact_id: contact_id,
                billing_contact_id: contact_id,
                booking_finance_account_id: finance_account,
                billing_finance_account_id: finance_account,
                billing_frequency_id: request.defaults.billing_frequency_id,
                booking_type_id: request.defaults.booking_type_id,
                channel_id: request.defaults.channel_id,
                notes: request.notes.clone(),
                room_stays: vec![RoomStayPayload {
                    start_date: request.stay.start_date,
                    end_date: request.stay.end_date,
                    number_of_adults: request.stay.adults,
                    number_of_children: request.stay.children,
                    number_of_infants: request.stay.infants,
                    rate_id: request.unit.rate_id.value(),
                    inventory_type: "UNIT_TYPE",
                    inventory_type_id: request.unit.inventory_type_id.value(),
                }],
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct RoomStayWire {
        id: i64,
        #[serde(default)]
        status: Option<String>,
    }

    impl From<RoomStayWire> for RoomStay {
        fn from(wire: RoomStayWire) -> Self {
            let status = match wire.status.as_deref() {
                Some("PENDING") => RoomStayStatus::Pending,
                Some("CONFIRMED") => RoomStayStatus::Confirmed,
                _ => RoomStayStatus::Enquiry,
            };
            RoomStay {
                id: wire.id.into(),
                status,
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct BookingWire {
        id: i64,
        booking_reference: String,
        #[serde(default)]
        room_stays: Vec<RoomStayWire>,
    }

    impl From<BookingWire> for Booking {
        fn from(wire: BookingWire) -> Self {
            Booking {
                id: wire.id.into(),
                booking_reference: wire.booking_reference,
                room_stays: wire.room_stays.into_iter().map(Into::into).collect(),
            }
        }
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct StatusUpdatePayload {
        status_updates: Vec<StatusUpdateEntry>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct StatusUpdateEntry {
        room_stay_id: i64,
        status: &'static str,
    }

    impl StatusUpdatePayload {
        pub(super) fn single(room_stay_id: RoomStayId, status: RoomStayStatus) -> Self {
            Self {
                status_updates: vec![StatusUpdateEntry {
                    room_stay_id: room_stay_id.value(),
                    status: status.as_str(),
                }],
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct InvoiceWire {
        id: i64,
        #[serde(default)]
        status: Option<String>,
    }

    impl From<InvoiceWire> for Invoice {
        fn from(wire: InvoiceWire) -> Self {
            Invoice {
                id: wire.id.into(),
                posted: wire.status.as_deref() == Some("POSTED"),
            }
        }
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct PaymentPayload {
        payment_reference: String,
        payment_type: &'static str,
        amount: f64,
        currency: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_four: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        card_type: Option<&'static str>,
    }

    impl PaymentPayload {
        pub(super) fn from_record(record: &PaymentRecord) -> Self {
            Self {
                payment_reference: record.payment_reference.clone(),
                payment_type: "CARD_PAYMENT",
                amount: record.amount.major_units(),
                currency: record.currency.clone(),
                last_four: record.last_four.clone(),
                card_type: record.card_network.map(|n| n.as_str()),
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct PaymentWire {
        payment_reference: String,
        amount: f64,
        #[serde(default)]
        currency: Option<String>,
        #[serde(default)]
        last_four: Option<String>,
    }

    impl From<PaymentWire> for PaymentRecord {
        fn from(wire: PaymentWire) -> Self {
            PaymentRecord {
                payment_reference: wire.payment_reference,
                amount: Money::from_major(wire.amount),
                currency: wire.currency.unwrap_or_default(),
                card_network: None,
                last_four: wire.last_four,
            }
        }
    }

    #[derive(Deserialize)]
    pub(super) struct AvailabilityPage {
        #[serde(default)]
        pub(super) content: Vec<AvailabilityWire>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct AvailabilityWire {
        #[serde(default)]
        building_id: Option<i64>,
        #[serde(default)]
        building_name: Option<String>,
        inventory_type_id: i64,
        #[serde(default)]
        inventory_type_name: Option<String>,
        #[serde(default)]
        rate_availabilities: Vec<RateAvailabilityWire>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct RateAvailabilityWire {
        rate_id: i64,
        rate_code: String,
        #[serde(default)]
        short_name: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        web_description: Option<String>,
        currency_code: String,
        totals: f64,
        avg_rate: f64,
        nights: i64,
    }

    #[derive(Deserialize)]
    pub(super) struct BuildingsPage {
        #[serde(default)]
        pub(super) content: Vec<BuildingWire>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct BuildingWire {
        id: i64,
        building_name: String,
        #[serde(default)]
        address_line1: Option<String>,
        #[serde(default)]
        address_line2: Option<String>,
        #[serde(default)]
        city: Option<String>,
        #[serde(default)]
        post_code: Option<String>,
    }

    impl From<BuildingWire> for Building {
        fn from(wire: BuildingWire) -> Self {
            let address = match (wire.address_line1, wire.address_line2) {
                (Some(line1), Some(line2)) => Some(format!("{line1}, {line2}")),
                (Some(line1), None) => Some(line1),
                (None, Some(line2)) => Some(line2),
                (None, None) => None,
            };
            Building {
                id: wire.id,
                name: wire.building_name,
                address,
                city: wire.city,
                post_code: wire.post_code,
            }
        }
    }

    impl From<AvailabilityWire> for PropertyAvailability {
        fn from(wire: AvailabilityWire) -> Self {
            PropertyAvailability {
                building_id: wire.building_id,
                building_name: wire.building_name,
                inventory_type_id: wire.inventory_type_id.into(),
                inventory_type_name: wire.inventory_type_name,
                rates: wire
                    .rate_availabilities
                    .into_iter()
                    .map(|rate| RateOffer {
                        rate_id: rate.rate_id.into(),
                        rate_code: rate.rate_code,
                        rate_name: rate
                            .short_name
                            .or_else(|| rate.description.clone())
                            .unwrap_or_default(),
                        currency: rate.currency_code,
                        total_price: rate.totals,
                        avg_nightly_rate: rate.avg_rate,
                        nights: rate.nights,
                        description: rate.web_description.or(rate.description),
                    })
                    .collect(),
            }
        }
    }

}

// ---------------------------------------------------------------------------
// In-memory implementation for tests
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct InMemoryBookingState {
    next_id: i64,
    contacts: Vec<Contact>,
    bookings: HashMap<i64, Booking>,
    invoices: HashMap<i64, Vec<Invoice>>,
    payments: HashMap<i64, Vec<PaymentRecord>>,
    statuses: HashMap<i64, RoomStayStatus>,
    availability: HashMap<String, Vec<PropertyAvailability>>,
    buildings: Vec<Building>,
    calls: Vec<&'static str>,

    fail_on_contact: bool,
    fail_on_booking: bool,
    fail_on_status_update: bool,
    fail_on_invoice_post: bool,
    fail_on_payment: bool,
    embed_room_stays: bool,
    auto_invoice: bool,
    failing_rate_codes: HashSet<String>,
}

/// In-memory booking provider for tests.
///
/// Bookings get one room stay and (by default) one unposted invoice;
/// every operation records its name so tests can assert which provider
/// calls happened.
#[derive(Debug, Clone)]
pub struct InMemoryBookingApi {
    state: Arc<RwLock<InMemoryBookingState>>,
}

impl Default for InMemoryBookingApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBookingApi {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryBookingState {
                next_id: 100,
                embed_room_stays: true,
                auto_invoice: true,
                ..Default::default()
            })),
        }
    }

    pub fn set_fail_on_contact(&self, fail: bool) {
        self.state.write().unwrap().fail_on_contact = fail;
    }

    pub fn set_fail_on_booking(&self, fail: bool) {
        self.state.write().unwrap().fail_on_booking = fail;
    }

    pub fn set_fail_on_status_update(&self, fail: bool) {
        self.state.write().unwrap().fail_on_status_update = fail;
    }

    pub fn set_fail_on_invoice_post(&self, fail: bool) {
        self.state.write().unwrap().fail_on_invoice_post = fail;
    }

    pub fn set_fail_on_payment(&self, fail: bool) {
        self.state.write().unwrap().fail_on_payment = fail;
    }

    /// When false, created bookings omit their room stays so callers
    /// must use the direct room-stays lookup.
    pub fn set_embed_room_stays(&self, embed: bool) {
        self.state.write().unwrap().embed_room_stays = embed;
    }

    /// When false, bookings are created without invoices.
    pub fn set_auto_invoice(&self, auto: bool) {
        self.state.write().unwrap().auto_invoice = auto;
    }

    pub fn set_rate_code_failing(&self, rate_code: &str, fail: bool) {
        let mut state = self.state.write().unwrap();
        if fail {
            state.failing_rate_codes.insert(rate_code.to_string());
        } else {
            state.failing_rate_codes.remove(rate_code);
        }
    }

    pub fn seed_availability(&self, rate_code: &str, results: Vec<PropertyAvailability>) {
        self.state
            .write()
            .unwrap()
            .availability
            .insert(rate_code.to_string(), results);
    }

    pub fn seed_buildings(&self, buildings: Vec<Building>) {
        self.state.write().unwrap().buildings = buildings;
    }

    pub fn contact_count(&self) -> usize {
        self.state.read().unwrap().contacts.len()
    }

    pub fn booking_count(&self) -> usize {
        self.state.read().unwrap().bookings.len()
    }

    pub fn payment_count(&self, booking_id: BookingId) -> usize {
        self.state
            .read()
            .unwrap()
            .payments
            .get(&booking_id.value())
            .map_or(0, Vec::len)
    }

    pub fn recorded_payments(&self, booking_id: BookingId) -> Vec<PaymentRecord> {
        self.state
            .read()
            .unwrap()
            .payments
            .get(&booking_id.value())
            .cloned()
            .unwrap_or_default()
    }

    pub fn status_of(&self, room_stay_id: RoomStayId) -> Option<RoomStayStatus> {
        self.state
            .read()
            .unwrap()
            .statuses
            .get(&room_stay_id.value())
            .copied()
    }

    pub fn posted_invoice_count(&self, booking_id: BookingId) -> usize {
        self.state
            .read()
            .unwrap()
            .invoices
            .get(&booking_id.value())
            .map_or(0, |invoices| invoices.iter().filter(|i| i.posted).count())
    }

    /// Names of every operation invoked, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.read().unwrap().calls.clone()
    }

    fn record_call(&self, name: &'static str) {
        self.state.write().unwrap().calls.push(name);
    }
}

#[async_trait]
impl BookingApi for InMemoryBookingApi {
    async fn create_contact(&self, _guest: &GuestDetails) -> Result<Contact, ProviderError> {
        self.record_call("create_contact");
        let mut state = self.state.write().unwrap();
        if state.fail_on_contact {
            return Err(ProviderError::ContactCreation(
                "contact rejected".to_string(),
            ));
        }
        state.next_id += 1;
        let contact = Contact {
            id: ContactId::new(state.next_id),
            finance_account_id: None,
        };
        state.contacts.push(contact.clone());
        Ok(contact)
    }

    async fn create_booking(&self, _request: &NewBooking) -> Result<Booking, ProviderError> {
        self.record_call("create_booking");
        let mut state = self.state.write().unwrap();
        if state.fail_on_booking {
            return Err(ProviderError::BookingCreation(
                "booking rejected".to_string(),
            ));
        }
        state.next_id += 1;
        let booking_id = state.next_id;
        state.next_id += 1;
        let room_stay = RoomStay {
            id: RoomStayId::new(state.next_id),
            status: RoomStayStatus::Enquiry,
        };
        state.statuses.insert(room_stay.id.value(), room_stay.status);

        let booking = Booking {
            id: BookingId::new(booking_id),
            booking_reference: format!("BK-{booking_id}"),
            room_stays: vec![room_stay],
        };
        state.bookings.insert(booking_id, booking.clone());

        if state.auto_invoice {
            state.next_id += 1;
            let invoice = Invoice {
                id: InvoiceId::new(state.next_id),
                posted: false,
            };
            state.invoices.entry(booking_id).or_default().push(invoice);
        }

        if state.embed_room_stays {
            Ok(booking)
        } else {
            Ok(Booking {
                room_stays: Vec::new(),
                ..booking
            })
        }
    }

    async fn booking(&self, id: BookingId) -> Result<Booking, ProviderError> {
        self.record_call("booking");
        self.state
            .read()
            .unwrap()
            .bookings
            .get(&id.value())
            .cloned()
            .ok_or_else(|| ProviderError::Lookup(format!("booking {id} not found")))
    }

    async fn room_stays(&self, booking_id: BookingId) -> Result<Vec<RoomStay>, ProviderError> {
        self.record_call("room_stays");
        self.state
            .read()
            .unwrap()
            .bookings
            .get(&booking_id.value())
            .map(|booking| booking.room_stays.clone())
            .ok_or_else(|| ProviderError::Lookup(format!("booking {booking_id} not found")))
    }

    async fn update_room_stay_status(
        &self,
        _booking_id: BookingId,
        room_stay_id: RoomStayId,
        status: RoomStayStatus,
    ) -> Result<(), ProviderError> {
        self.record_call("update_room_stay_status");
        let mut state = self.state.write().unwrap();
        if state.fail_on_status_update {
            return Err(ProviderError::StatusUpdate(
                "status update rejected".to_string(),
            ));
        }
        state.statuses.insert(room_stay_id.value(), status);
        Ok(())
    }

    async fn booking_invoices(
        &self,
        booking_id: BookingId,
    ) -> Result<Vec<Invoice>, ProviderError> {
        self.record_call("booking_invoices");
        Ok(self
            .state
            .read()
            .unwrap()
            .invoices
            .get(&booking_id.value())
            .cloned()
            .unwrap_or_default())
    }

    async fn post_invoice(&self, invoice_id: InvoiceId) -> Result<(), ProviderError> {
        self.record_call("post_invoice");
        let mut state = self.state.write().unwrap();
        if state.fail_on_invoice_post {
            return Err(ProviderError::InvoicePosting(
                "invoice posting rejected".to_string(),
            ));
        }
        for invoices in state.invoices.values_mut() {
            for invoice in invoices.iter_mut() {
                if invoice.id == invoice_id {
                    invoice.posted = true;
                }
            }
        }
        Ok(())
    }

    async fn create_payment(
        &self,
        booking_id: BookingId,
        record: &PaymentRecord,
    ) -> Result<(), ProviderError> {
        self.record_call("create_payment");
        let mut state = self.state.write().unwrap();
        if state.fail_on_payment {
            return Err(ProviderError::PaymentRecording(
                "payment rejected".to_string(),
            ));
        }
        state
            .payments
            .entry(booking_id.value())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn booking_payments(
        &self,
        booking_id: BookingId,
    ) -> Result<Vec<PaymentRecord>, ProviderError> {
        self.record_call("booking_payments");
        Ok(self.recorded_payments(booking_id))
    }

    async fn search_availability(
        &self,
        rate_code: &str,
        _query: &AvailabilityQuery,
    ) -> Result<Vec<PropertyAvailability>, ProviderError> {
        self.record_call("search_availability");
        let state = self.state.read().unwrap();
        if state.failing_rate_codes.contains(rate_code) {
            return Err(ProviderError::Lookup(format!(
                "rate code {rate_code} unavailable"
            )));
        }
        Ok(state
            .availability
            .get(rate_code)
            .cloned()
            .unwrap_or_default())
    }

    async fn buildings(&self) -> Result<Vec<Building>, ProviderError> {
        self.record_call("buildings");
        Ok(self.state.read().unwrap().buildings.clone())
    }
}
