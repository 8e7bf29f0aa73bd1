use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {TableWrapper, div, "w-full overflow-x-auto rounded-md border"}
    clx! {Table, table, "w-full caption-bottom text-sm"}
    clx! {TableHeader, thead, "bg-primary text-primary-foreground"}
    clx! {TableBody, tbody, "[&_tr:last-child]:border-0"}
    clx! {TableRow, tr, "border-b transition-colors hover:bg-muted/50"}
    clx! {TableHead, th, "h-9 px-2 text-left align-middle font-medium whitespace-nowrap"}
    clx! {TableCell, td, "p-2 align-middle whitespace-nowrap"}
}

pub use components::*;
