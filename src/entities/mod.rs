pub mod cart_item;
pub mod delivery_area;
pub mod delivery_setting;
pub mod order;
pub mod order_item;
pub mod product;

pub use cart_item::Entity as CartItem;
pub use delivery_area::Entity as DeliveryArea;
pub use delivery_setting::Entity as DeliverySetting;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use product::Entity as Product;
