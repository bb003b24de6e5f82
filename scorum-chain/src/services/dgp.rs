use crate::database::Database;
use crate::error::Result;
use crate::schema::DynamicGlobalPropertyObject;
use crate::time::TimePointSec;
use crate::types::Hardfork;
use chainbase::ObjectId;

const DGP_ID: ObjectId<DynamicGlobalPropertyObject> = ObjectId::new(0);

pub trait DynamicGlobalPropertyService {
    fn dynamic_global_properties(&self) -> Result<&DynamicGlobalPropertyObject>;

    fn update_dynamic_global_properties<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut DynamicGlobalPropertyObject);

    fn head_block_time(&self) -> Result<TimePointSec> {
        Ok(self.dynamic_global_properties()?.time)
    }

    fn head_block_num(&self) -> Result<u32> {
        Ok(self.dynamic_global_properties()?.head_block_number)
    }

    fn has_hardfork(&self, hardfork: Hardfork) -> Result<bool> {
        Ok(self.dynamic_global_properties()?.hardfork >= hardfork)
    }
}

impl DynamicGlobalPropertyService for Database {
    fn dynamic_global_properties(&self) -> Result<&DynamicGlobalPropertyObject> {
        Ok(self.dynamic_global_properties.get(DGP_ID)?)
    }

    fn update_dynamic_global_properties<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut DynamicGlobalPropertyObject),
    {
        self.dynamic_global_properties.modify(DGP_ID, f)?;
        Ok(())
    }
}
